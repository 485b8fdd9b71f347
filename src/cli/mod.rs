//! CLI commands for the triage simulator using clap.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use crate::agent::{Agent, ServiceObserver};
use crate::config::{load_settings_or_default, Settings};
use crate::core::{Message, PriorityQueue, Scorer, SelectionPolicy};
use crate::dispatch::{dispatch_all, dispatch_selection, enqueue, DispatchReport, Dispatcher};
use crate::error::Error;

/// Message triage simulator.
#[derive(Parser)]
#[command(name = "triage-sim")]
#[command(version = "0.1.0")]
#[command(about = "Score incoming messages and let a pool of agents work through them", long_about = None)]
pub struct Commands {
    /// Settings file (defaults to ~/.triage-sim/settings.json)
    #[arg(long, global = true, env = "TRIAGE_SIM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the length of one service time unit in milliseconds
    #[arg(long, global = true)]
    pub time_unit_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Enter messages interactively and dispatch agents (default)
    Interactive,

    /// Show the priority of a message
    Score {
        /// Message text
        text: String,
    },

    /// Enqueue messages and dispatch agents without prompting
    Run {
        /// Which messages the agents should service
        #[arg(long, value_enum, default_value_t = SelectionPolicy::All)]
        policy: SelectionPolicy,

        /// Message texts
        #[arg(required = true)]
        messages: Vec<String>,
    },
}

/// Observer that prints service events to stdout.
pub struct ConsoleObserver;

impl ServiceObserver for ConsoleObserver {
    fn on_started(&self, agent: &Agent, message: &Message) {
        println!("Agent {} servicing message: {}", agent.id(), message);
        tracing::debug!(agent = %agent.id(), "Servicing message: {}", message);
    }

    fn on_finished(&self, agent: &Agent, message: &Message) {
        println!("Agent {} finished message: {}", agent.id(), message);
        tracing::debug!(agent = %agent.id(), "Finished message: {}", message);
    }
}

impl Commands {
    /// Run the command.
    pub async fn run(&self) -> Result<()> {
        let mut settings = load_settings_or_default(self.config.as_deref())?;
        if let Some(time_unit_ms) = self.time_unit_ms {
            settings.simulation.time_unit_ms = time_unit_ms;
        }

        match self.command.as_ref().unwrap_or(&Command::Interactive) {
            Command::Interactive => cmd_interactive(&settings).await,
            Command::Score { text } => cmd_score(&settings, text),
            Command::Run { policy, messages } => cmd_run(&settings, *policy, messages).await,
        }
    }
}

// Command implementations

async fn cmd_interactive(settings: &Settings) -> Result<()> {
    let scorer = Scorer::new(settings.keywords.clone());
    let dispatcher = Dispatcher::from_settings(settings, Arc::new(ConsoleObserver))?;
    let queue = Arc::new(PriorityQueue::new());

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    run_interactive(&mut input, &mut output, queue, &scorer, &dispatcher).await
}

fn cmd_score(settings: &Settings, text: &str) -> Result<()> {
    let scorer = Scorer::new(settings.keywords.clone());
    let matched = scorer.matched_keywords(text);

    println!("Priority: {}", scorer.score(text));
    if matched.is_empty() {
        println!("No keywords matched");
    }
    for (keyword, weight) in matched {
        println!("  {:<16} +{}", keyword, weight);
    }
    Ok(())
}

async fn cmd_run(settings: &Settings, policy: SelectionPolicy, messages: &[String]) -> Result<()> {
    let scorer = Scorer::new(settings.keywords.clone());
    let dispatcher = Dispatcher::from_settings(settings, Arc::new(ConsoleObserver))?;
    let queue = Arc::new(PriorityQueue::new());

    for text in messages {
        let message = enqueue(&queue, &scorer, text.as_str());
        println!("Queued (priority {}): {}", message.priority(), message);
    }

    let report = dispatch_policy(&queue, &dispatcher, policy).await?;
    println!("{}", report);
    if !queue.is_empty() {
        println!("Left in queue: {}", queue);
    }
    Ok(())
}

async fn dispatch_policy(
    queue: &Arc<PriorityQueue>,
    dispatcher: &Dispatcher,
    policy: SelectionPolicy,
) -> crate::error::Result<DispatchReport> {
    match policy {
        SelectionPolicy::All => Ok(dispatch_all(Arc::clone(queue), dispatcher).await),
        policy => dispatch_selection(queue, dispatcher, policy).await,
    }
}

/// Read one trimmed line after printing `prompt`. `None` on end of input.
fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> Result<Option<String>> {
    write!(output, "{}", prompt)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Ask a Y/N question until answered. End of input counts as `default`.
fn ask_yes_no<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
    default: bool,
) -> Result<bool> {
    loop {
        match prompt(input, output, question)? {
            None => return Ok(default),
            Some(answer) => match answer.to_uppercase().as_str() {
                "Y" => return Ok(true),
                "N" => return Ok(false),
                _ => continue,
            },
        }
    }
}

fn add_messages<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    queue: &PriorityQueue,
    scorer: &Scorer,
) -> Result<()> {
    while ask_yes_no(input, output, "Add a message? (Y/N): ", false)? {
        let Some(text) = prompt(input, output, "Enter the message: ")? else {
            break;
        };
        let message = enqueue(queue, scorer, text);
        writeln!(output, "Queued with priority {}", message.priority())?;
    }
    Ok(())
}

fn ask_policy<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Option<SelectionPolicy>> {
    loop {
        writeln!(output, "1 = service all messages")?;
        writeln!(output, "2 = service the first and last of the most common priority")?;
        writeln!(output, "3 = service the longest and shortest of the most common priority")?;
        let policy = match prompt(input, output, "Option: ")?.as_deref() {
            None => return Ok(None),
            Some("1") => SelectionPolicy::All,
            Some("2") => SelectionPolicy::FirstLast,
            Some("3") => SelectionPolicy::LongestShortest,
            Some(_) => continue,
        };
        return Ok(Some(policy));
    }
}

/// Interactive session: add messages, pick a policy, dispatch, repeat.
pub async fn run_interactive<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    queue: Arc<PriorityQueue>,
    scorer: &Scorer,
    dispatcher: &Dispatcher,
) -> Result<()> {
    loop {
        add_messages(input, output, &queue, scorer)?;

        if queue.is_empty() {
            writeln!(output, "No messages to dispatch.")?;
        } else {
            let Some(policy) = ask_policy(input, output)? else {
                return Ok(());
            };
            match dispatch_policy(&queue, dispatcher, policy).await {
                Ok(report) => writeln!(output, "{}", report)?,
                Err(Error::EmptyQueue) => writeln!(output, "The queue is empty, nothing to dispatch.")?,
                Err(e) => return Err(e.into()),
            }
            if !queue.is_empty() {
                writeln!(output, "Left in queue: {}", queue)?;
            }
        }

        if ask_yes_no(input, output, "Finish? (Y/N): ", true)? {
            return Ok(());
        }
    }
}
