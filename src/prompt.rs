//! Add-stream flow
//!
//! Asks for a display name, then for an address, and hands both to a form
//! that gets submitted. A cancelled or empty answer at either stage ends the
//! flow quietly with nothing written. Answers are kept as typed.

use anyhow::Result;
use std::io::{BufRead, Write};

use crate::streams::{Stream, StreamList};

pub const NAME_QUESTION: &str = "Enter the display name of the stream";
pub const ADDRESS_QUESTION: &str = "Enter the address of the stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Name,
    Address,
}

/// What the flow wants next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Ask(&'static str),
    Submit(Stream),
    Abort,
}

/// Two-stage input collection, fed one answer at a time
#[derive(Debug, Clone)]
pub struct AddStreamFlow {
    stage: Stage,
    name: String,
}

impl Default for AddStreamFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl AddStreamFlow {
    pub fn new() -> Self {
        Self {
            stage: Stage::Name,
            name: String::new(),
        }
    }

    pub fn question(&self) -> &'static str {
        match self.stage {
            Stage::Name => NAME_QUESTION,
            Stage::Address => ADDRESS_QUESTION,
        }
    }

    /// Feed the answer to the current question; `None` means cancelled
    pub fn answer(&mut self, input: Option<String>) -> Step {
        let Some(value) = non_empty(input) else {
            return Step::Abort;
        };

        match self.stage {
            Stage::Name => {
                self.name = value;
                self.stage = Stage::Address;
                Step::Ask(ADDRESS_QUESTION)
            }
            Stage::Address => Step::Submit(Stream::new(std::mem::take(&mut self.name), value)),
        }
    }
}

/// The answer, or `None` if cancelled or empty
pub fn non_empty(input: Option<String>) -> Option<String> {
    input.filter(|s| !s.is_empty())
}

/// Source of answers, e.g. a terminal
pub trait Prompter {
    /// Ask a question; `Ok(None)` when the user cancelled
    fn prompt(&mut self, message: &str) -> Result<Option<String>>;
}

/// Destination of a finished flow
pub trait StreamForm {
    fn fill(&mut self, name: &str, address: &str);
    fn submit(&mut self) -> Result<()>;
}

/// Run the whole flow; returns whether the form was submitted
pub fn add_stream(prompter: &mut impl Prompter, form: &mut impl StreamForm) -> Result<bool> {
    let mut flow = AddStreamFlow::new();
    let mut question = flow.question();

    loop {
        let input = prompter.prompt(question)?;
        match flow.answer(input) {
            Step::Ask(next) => question = next,
            Step::Submit(stream) => {
                form.fill(&stream.name, &stream.address);
                form.submit()?;
                return Ok(true);
            }
            Step::Abort => {
                tracing::debug!("Add stream cancelled");
                return Ok(false);
            }
        }
    }
}

/// Line-based prompter; end of input counts as cancel
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn prompt(&mut self, message: &str) -> Result<Option<String>> {
        write!(self.output, "{}: ", message)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Form that appends the stream to the streams file
pub struct FileForm<'a> {
    list: &'a mut StreamList,
    pending: Option<Stream>,
}

impl<'a> FileForm<'a> {
    pub fn new(list: &'a mut StreamList) -> Self {
        Self { list, pending: None }
    }
}

impl StreamForm for FileForm<'_> {
    fn fill(&mut self, name: &str, address: &str) {
        self.pending = Some(Stream::new(name, address));
    }

    fn submit(&mut self) -> Result<()> {
        let Some(stream) = self.pending.take() else {
            anyhow::bail!("Nothing to submit");
        };

        tracing::info!("Adding stream {} ({})", stream.name, stream.address);
        self.list.add(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Cursor;

    struct Scripted {
        answers: VecDeque<Option<String>>,
        asked: Vec<String>,
    }

    impl Scripted {
        fn new(answers: &[Option<&str>]) -> Self {
            Self {
                answers: answers.iter().map(|a| a.map(str::to_string)).collect(),
                asked: Vec::new(),
            }
        }
    }

    impl Prompter for Scripted {
        fn prompt(&mut self, message: &str) -> Result<Option<String>> {
            self.asked.push(message.to_string());
            Ok(self.answers.pop_front().flatten())
        }
    }

    #[derive(Default)]
    struct RecordingForm {
        fields: Option<(String, String)>,
        submitted: bool,
    }

    impl StreamForm for RecordingForm {
        fn fill(&mut self, name: &str, address: &str) {
            self.fields = Some((name.to_string(), address.to_string()));
        }

        fn submit(&mut self) -> Result<()> {
            self.submitted = true;
            Ok(())
        }
    }

    #[test]
    fn test_full_flow_submits() {
        let mut prompter = Scripted::new(&[Some("Studio One"), Some("http://studio.one/live")]);
        let mut form = RecordingForm::default();

        assert!(add_stream(&mut prompter, &mut form).unwrap());
        assert_eq!(prompter.asked, vec![NAME_QUESTION, ADDRESS_QUESTION]);
        assert_eq!(
            form.fields,
            Some(("Studio One".to_string(), "http://studio.one/live".to_string()))
        );
        assert!(form.submitted);
    }

    #[test]
    fn test_empty_address_aborts() {
        let mut prompter = Scripted::new(&[Some("Studio One"), Some("")]);
        let mut form = RecordingForm::default();

        assert!(!add_stream(&mut prompter, &mut form).unwrap());
        assert_eq!(form.fields, None);
        assert!(!form.submitted);
    }

    #[test]
    fn test_cancelled_name_skips_address() {
        let mut prompter = Scripted::new(&[None, Some("http://never.asked")]);
        let mut form = RecordingForm::default();

        assert!(!add_stream(&mut prompter, &mut form).unwrap());
        assert_eq!(prompter.asked, vec![NAME_QUESTION]);
        assert!(!form.submitted);
    }

    #[test]
    fn test_only_empty_answer_aborts() {
        let mut flow = AddStreamFlow::new();
        assert_eq!(flow.answer(Some(String::new())), Step::Abort);

        let mut flow = AddStreamFlow::new();
        assert_eq!(flow.answer(Some("  ".to_string())), Step::Ask(ADDRESS_QUESTION));
        assert_eq!(flow.question(), ADDRESS_QUESTION);
        assert_eq!(
            flow.answer(Some(" http://jazz".to_string())),
            Step::Submit(Stream::new("  ", " http://jazz"))
        );
    }

    #[test]
    fn test_line_prompter() {
        let input = Cursor::new("Radio Nova\r\nhttp://nova/stream\n");
        let mut output = Vec::new();
        let mut prompter = LinePrompter::new(input, &mut output);

        assert_eq!(prompter.prompt("Name").unwrap().as_deref(), Some("Radio Nova"));
        assert_eq!(prompter.prompt("Address").unwrap().as_deref(), Some("http://nova/stream"));
        assert_eq!(prompter.prompt("More").unwrap(), None);

        assert_eq!(String::from_utf8(output).unwrap(), "Name: Address: More: ");
    }

    #[test]
    fn test_file_form_writes_streams_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("streams.json");
        let mut list = StreamList::load(&path).unwrap();

        let input = Cursor::new("Radio Nova\nhttp://nova/stream\n");
        let mut prompter = LinePrompter::new(input, std::io::sink());
        let added = add_stream(&mut prompter, &mut FileForm::new(&mut list)).unwrap();

        assert!(added);
        let reloaded = StreamList::load(&path).unwrap();
        assert_eq!(reloaded.find("Radio Nova").map(|s| s.address.as_str()), Some("http://nova/stream"));
    }

    #[test]
    fn test_file_form_untouched_on_abort() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("streams.json");
        let mut list = StreamList::load(&path).unwrap();

        let input = Cursor::new("Studio One\n\n");
        let mut prompter = LinePrompter::new(input, std::io::sink());
        let added = add_stream(&mut prompter, &mut FileForm::new(&mut list)).unwrap();

        assert!(!added);
        assert!(!path.exists());
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_file_form_failed_save_keeps_list() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let mut list = StreamList::load(blocker.join("streams.json")).unwrap();

        let mut form = FileForm::new(&mut list);
        form.fill("Jazz", "http://jazz.example/stream");

        assert!(form.submit().is_err());
        assert_eq!(list.len(), 2);
        assert!(list.find("Jazz").is_none());
    }
}
