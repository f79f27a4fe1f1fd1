// Command line surface. Flags shared by every subcommand are global, so
// `qna ask --service ...` and `qna --service ... ask` both work. After
// parsing, values missing on the command line are filled from the config
// file, required options are checked, and the command is run once or once
// per input line.

use crate::api::ApiClient;
use crate::batch::Runner;
use crate::commands::{CommandDescriptor, CommandKind, CommandOptions};
use crate::config::{load_properties, Properties, KEY_API_KEY, KEY_LLM, KEY_SERVICE, KEY_SYSTEM};
use crate::output::{OutputFormat, OutputSink};
use crate::render::RenderContext;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "qna", version, about = "Command line client for a hosted QnA / RAG service")]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Service to target, e.g. mycompany.example.io
    #[arg(long, global = true, env = "QNA_SERVICE")]
    pub service: Option<String>,

    /// API key sent with every request
    #[arg(short = 'k', long, global = true, env = "QNA_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Config file. Command line values override values in it
    #[arg(short = 'c', long, alias = "cf", global = true)]
    pub config_file: Option<PathBuf>,

    /// File with one input per line; lines starting with # are skipped
    #[arg(short = 'i', long, alias = "if", global = true)]
    pub input_file: Option<PathBuf>,

    /// Write results to this file instead of stdout
    #[arg(short = 'o', long, alias = "of", global = true)]
    pub output_file: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Console, global = true)]
    pub output_format: OutputFormat,

    /// Seconds to wait between calls when reading an input file [default: 1]
    #[arg(short = 'd', long, alias = "ds", global = true)]
    pub delay_secs: Option<u64>,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all available QnA systems
    ListSystems,
    /// Get details of a QnA system
    GetSystem(SystemArgs),
    /// List the LLM providers available in a QnA system
    ListLlms(SystemArgs),
    /// Ask a question
    Ask(AskArgs),
    /// List the questions asked in a QnA system
    ListQuestions(SystemArgs),
    /// Get details of a previously asked question
    #[command(name = "get-questions", alias = "get-question")]
    GetQuestions(GetQuestionArgs),
    /// Semantic search in a QnA system
    Search(SearchArgs),
}

#[derive(Args, Debug)]
pub struct SystemArgs {
    /// Id of the QnA system to target
    #[arg(long = "system", alias = "qa")]
    pub system: Option<String>,
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Id of the QnA system to target
    #[arg(long = "system", alias = "qa")]
    pub system: Option<String>,

    /// Id of the LLM provider that generates the answer
    #[arg(long)]
    pub llm: Option<String>,

    /// Question text
    #[arg(short = 'q', long)]
    pub question: Option<String>,

    /// Filter expression
    #[arg(long, alias = "ft")]
    pub filter: Option<String>,

    /// Query plan sent as the JSON request body
    #[arg(long, alias = "qp")]
    pub query_plan: Option<String>,

    /// Extra properties passed to the service
    #[arg(long, alias = "ps")]
    pub properties: Option<String>,

    /// Show probe data
    #[arg(short = 'p', long)]
    pub probe: bool,
}

#[derive(Args, Debug)]
pub struct GetQuestionArgs {
    /// Id of the QnA system to target
    #[arg(long = "system", alias = "qa")]
    pub system: Option<String>,

    /// Id of the question
    #[arg(long, alias = "qid")]
    pub question_id: Option<String>,

    /// Show probe data
    #[arg(short = 'p', long)]
    pub probe: bool,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Id of the QnA system to target
    #[arg(long = "system", alias = "qa")]
    pub system: Option<String>,

    /// Query text
    #[arg(short = 'q', long, alias = "query")]
    pub question: Option<String>,

    /// Filter expression
    #[arg(long, alias = "ft")]
    pub filter: Option<String>,

    /// Query plan sent as the JSON request body
    #[arg(long, alias = "qp")]
    pub query_plan: Option<String>,

    /// Extra properties passed to the service
    #[arg(long, alias = "ps")]
    pub properties: Option<String>,

    /// Show probe data
    #[arg(short = 'p', long)]
    pub probe: bool,
}

impl Command {
    pub fn into_parts(self) -> (CommandKind, CommandOptions) {
        match self {
            Command::ListSystems => (CommandKind::ListSystems, CommandOptions::default()),
            Command::GetSystem(args) => (CommandKind::GetSystem, system_only(args)),
            Command::ListLlms(args) => (CommandKind::ListLlms, system_only(args)),
            Command::ListQuestions(args) => (CommandKind::ListQuestions, system_only(args)),
            Command::Ask(args) => (
                CommandKind::Ask,
                CommandOptions {
                    system_id: args.system,
                    llm_id: args.llm,
                    question: args.question,
                    filter: args.filter,
                    query_plan: args.query_plan,
                    properties: args.properties,
                    show_probe: args.probe,
                    ..CommandOptions::default()
                },
            ),
            Command::GetQuestions(args) => (
                CommandKind::GetQuestion,
                CommandOptions {
                    system_id: args.system,
                    question_id: args.question_id,
                    show_probe: args.probe,
                    ..CommandOptions::default()
                },
            ),
            Command::Search(args) => (
                CommandKind::Search,
                CommandOptions {
                    system_id: args.system,
                    question: args.question,
                    filter: args.filter,
                    query_plan: args.query_plan,
                    properties: args.properties,
                    show_probe: args.probe,
                    ..CommandOptions::default()
                },
            ),
        }
    }
}

fn system_only(args: SystemArgs) -> CommandOptions {
    CommandOptions {
        system_id: args.system,
        ..CommandOptions::default()
    }
}

/// Fill options the command line left out from the config file.
fn overlay_options(options: CommandOptions, props: &Properties) -> CommandOptions {
    CommandOptions {
        system_id: props.overlay(options.system_id, KEY_SYSTEM),
        llm_id: props.overlay(options.llm_id, KEY_LLM),
        ..options
    }
}

/// Everything needed to run one invocation, resolved and validated.
pub struct Invocation {
    pub client: ApiClient,
    pub runner: Runner,
    /// Contents of the input file, when one was given.
    pub input: Option<String>,
}

impl Invocation {
    /// Resolve flags against the config file and check them. No network
    /// traffic happens here.
    pub fn prepare(cli: Cli) -> Result<Self> {
        let common = cli.common;
        let (kind, options) = cli.command.into_parts();
        let descriptor: &'static CommandDescriptor = kind.descriptor();

        let props = load_properties(common.config_file.as_deref())?;
        let options = overlay_options(options, &props);
        let delay = Duration::from_secs(props.delay_secs(common.delay_secs)?);

        let input = common
            .input_file
            .as_deref()
            .map(|path| {
                std::fs::read_to_string(path).with_context(|| {
                    format!("Input file does not exist or cannot be read: {}", path.display())
                })
            })
            .transpose()?;
        descriptor.validate(&options, input.is_some())?;

        let service = props.overlay(common.service, KEY_SERVICE).unwrap_or_default();
        let api_key = props.overlay(common.api_key, KEY_API_KEY).unwrap_or_default();
        let client = ApiClient::new(&service, &api_key)?;
        debug!(command = descriptor.name, service = client.base_url(), "prepared");

        let sink = match common.output_file.as_deref() {
            Some(path) => OutputSink::file(path)?,
            None => OutputSink::Stdout,
        };
        let render = RenderContext {
            color: common.output_format == OutputFormat::Console
                && !sink.is_file()
                && std::io::stdout().is_terminal(),
        };

        Ok(Invocation {
            client,
            runner: Runner {
                descriptor,
                options,
                format: common.output_format,
                sink,
                render,
                delay,
            },
            input,
        })
    }

    pub fn execute(self) -> Result<()> {
        let Invocation {
            client,
            runner,
            input,
        } = self;
        let descriptor = runner.descriptor;
        let call = |opts: &CommandOptions| descriptor.invoke(&client, opts);
        match input {
            Some(text) => {
                runner.run_batch(&text, call)?;
            }
            None => {
                runner.run_once(call)?;
            }
        }
        Ok(())
    }
}

/// Entry point used by `main`.
pub fn run(cli: Cli) -> Result<()> {
    Invocation::prepare(cli)?.execute()
}
