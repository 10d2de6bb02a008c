use anyhow::Result;
use pdfqa_rag::{AnswerGenerator, RagPipeline};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, error};

const PROMPT: &str = "You: ";
const QUIT_WORDS: [&str; 3] = ["quit", "exit", "bye"];

/// What a line typed at the prompt asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Quit,
    Empty,
    Question(&'a str),
}

impl<'a> Input<'a> {
    pub fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            Self::Empty
        } else if QUIT_WORDS.iter().any(|w| trimmed.eq_ignore_ascii_case(w)) {
            Self::Quit
        } else {
            Self::Question(trimmed)
        }
    }
}

/// History is a convenience; failing to record an entry is not fatal.
fn remember(rl: &mut DefaultEditor, question: &str) {
    if let Err(e) = rl.add_history_entry(question) {
        debug!(error = %e, "could not record history entry");
    }
}

/// Read questions until a quit word, Ctrl-C or Ctrl-D.
pub async fn run(pipeline: &RagPipeline, generator: &AnswerGenerator) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    loop {
        let line = match rl.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!("\nGoodbye!");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let question = match Input::parse(&line) {
            Input::Quit => {
                println!("Goodbye!");
                return Ok(());
            }
            Input::Empty => continue,
            Input::Question(question) => question,
        };
        remember(&mut rl, question);

        println!("Searching knowledge base...");
        let context = match pipeline.retrieve_context(question).await {
            Ok(context) => context,
            Err(e) => {
                error!(error = %e, "retrieval failed");
                println!("Error: {e}");
                continue;
            }
        };

        println!("Generating response...");
        let reply = generator.answer(question, &context).await;
        println!("\nAssistant: {reply}\n");
    }
}
