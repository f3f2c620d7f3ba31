#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;

use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use owo_colors::OwoColorize;
use strum::VariantNames;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::BackendSettings;
use crate::domain::models::PageContext;
use crate::domain::models::SplitLinePolicy;
use crate::infrastructure::backends::ollama::base_model_names;
use crate::infrastructure::backends::ollama::Ollama;

/// The page a chat is opened for, plus a quote to attach straight away.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Launch {
    pub page: PageContext,
    pub quote: Option<String>,
}

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /quote [TEXT] - Attaches TEXT as a quote to your next message, replacing any pending quote.
- /dismiss (/d) - Removes the pending quote.
- /modellist (/ml) - Lists the models known to the chat window.
- /model (/m) [MODEL_NAME] - Uses MODEL_NAME for the following messages.
- /help (/h) - Provides this help menu.
- /quit /exit (/q) - Exit the chat.
        "#;

    return text.trim().to_string();
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

async fn print_models(list_base_names: bool) -> Result<()> {
    let backend = Ollama::new(BackendSettings::from_config())?;
    backend.health_check().await?;

    let mut models = backend.list_models().await?;
    if list_base_names {
        models = base_model_names(&models);
    }

    if models.is_empty() {
        println!("The server has no models available. Pull one first, for example `ollama pull llama2`.");
        return Ok(());
    }

    let default_model = Config::get(ConfigKey::Model);
    for model in models {
        if model == default_model {
            println!("* {model}");
        } else {
            println!("  {model}");
        }
    }

    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_models() -> Command {
    return Command::new("models")
        .about("Verifies the model server is reachable and lists its models.")
        .arg(
            Arg::new("base-names")
                .long("base-names")
                .help("List model names without their tags, once each.")
                .action(ArgAction::SetTrue),
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for pagechat")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running pagechat with environment variable RUST_LOG=pagechat")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn arg_page_title() -> Arg {
    return Arg::new("title")
        .long("title")
        .num_args(1)
        .help("Title of the page the chat is opened next to.");
}

fn arg_page_url() -> Arg {
    return Arg::new("url")
        .long("url")
        .num_args(1)
        .help("URL of the page the chat is opened next to.");
}

fn arg_page_icon() -> Arg {
    return Arg::new("icon")
        .long("icon")
        .num_args(1)
        .help("Icon reference of the page the chat is opened next to.");
}

fn arg_quote() -> Arg {
    return Arg::new("quote")
        .long("quote")
        .num_args(1)
        .help("Selected page text to attach to the first message.");
}

fn arg_model() -> Arg {
    return Arg::new(ConfigKey::Model.to_string())
        .short('m')
        .long(ConfigKey::Model.to_string())
        .env("PAGECHAT_MODEL")
        .num_args(1)
        .help("The default model to chat with. Falls back to the first known model, then to llama2.")
        .global(true);
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") {
                return format!("CHAT {line}").bold().underline().to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("pagechat")
        .about(about)
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .subcommand(subcommand_models())
        .arg(arg_page_title())
        .arg(arg_page_url())
        .arg(arg_page_icon())
        .arg(arg_quote())
        .arg(arg_model())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("PAGECHAT_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::OllamaURL.to_string())
                .long(ConfigKey::OllamaURL.to_string())
                .env("PAGECHAT_OLLAMA_URL")
                .num_args(1)
                .help(format!("Ollama API URL. [default: {}]", Config::default(ConfigKey::OllamaURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Models.to_string())
                .long(ConfigKey::Models.to_string())
                .env("PAGECHAT_MODELS")
                .num_args(1)
                .help("Comma separated list of models offered in the chat window.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Stream.to_string())
                .long(ConfigKey::Stream.to_string())
                .env("PAGECHAT_STREAM")
                .num_args(1)
                .help(format!("Stream responses token by token instead of waiting for the whole reply. [default: {}]", Config::default(ConfigKey::Stream)))
                .value_parser(PossibleValuesParser::new(["true", "false"]))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::StreamLinePolicy.to_string())
                .long(ConfigKey::StreamLinePolicy.to_string())
                .env("PAGECHAT_STREAM_LINE_POLICY")
                .num_args(1)
                .help(format!("What to do with a response line split across two network chunks. [default: {}]", Config::default(ConfigKey::StreamLinePolicy)))
                .value_parser(PossibleValuesParser::new(SplitLinePolicy::VARIANTS))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::SystemPrompt.to_string())
                .long(ConfigKey::SystemPrompt.to_string())
                .env("PAGECHAT_SYSTEM_PROMPT")
                .num_args(1)
                .help("System prompt sent with every message.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::BackendHealthCheckTimeout.to_string())
                .long(ConfigKey::BackendHealthCheckTimeout.to_string())
                .env("PAGECHAT_BACKEND_HEALTH_CHECK_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds before timing out when checking the model server. [default: {}]", Config::default(ConfigKey::BackendHealthCheckTimeout)))
                .global(true),
        );
}

pub fn launch_from_matches(matches: &ArgMatches) -> Launch {
    let get = |name: &str| {
        return matches
            .get_one::<String>(name)
            .map(|val| return val.to_string())
            .unwrap_or_default();
    };

    let quote = matches
        .get_one::<String>("quote")
        .filter(|quote| return !quote.trim().is_empty())
        .map(|quote| return quote.to_string());

    return Launch {
        page: PageContext::new(&get("title"), &get("url"), &get("icon")),
        quote,
    };
}

/// Parses arguments and loads configuration. Returns the chat to open, or
/// `None` when a subcommand already did all the work.
pub async fn parse() -> Result<Option<Launch>> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    let log_path = dirs::cache_dir()
                        .unwrap_or_default()
                        .join("pagechat/debug.log");
                    println!("{}", log_path.to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    println!("{}", ConfigKey::VARIANTS.join("\n"));
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(None);
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(None);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(None);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(None);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(None);
            }
        },
        Some(("models", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            print_models(subcmd_matches.get_flag("base-names")).await?;
            return Ok(None);
        }
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(Some(launch_from_matches(&matches)));
}
