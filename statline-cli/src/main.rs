//! # Statline CLI
//!
//! Compares direct LLM answers against a data-aware analyst agent over a
//! CSV of NFL receiving statistics.
//!
//! Usage:
//!   statline                         # the two-question demo
//!   statline ask "Which team ...?"   # one ad-hoc question, both responders
//!   statline truth                   # ground truth only, no model needed
//!   statline schema                  # tool schema handed to the model
//!
//! Requires a local Ollama daemon with the model pulled:
//!   ollama serve && ollama pull gpt-oss:20b

use clap::{Parser, Subcommand};
use statline_agent::{Agent, AgentConfig};
use statline_llm::{LlmProvider, OllamaProvider, ProviderConfig};
use statline_table::Table;

const PLAYER_QUESTION: &str = "Which player had the most receiving touchdowns in 2025?";
const TEAM_QUESTION: &str = "Which team had the most receiving touchdowns in 2025?";

const PLAYER_COLUMN: &str = "PlayerName";
const TEAM_COLUMN: &str = "Team";
const TD_COLUMN: &str = "ReceivingTD";

const SEPARATOR: &str = "\n--------------------------------\n";

#[derive(Parser)]
#[command(name = "statline")]
#[command(author, version, about = "Direct LLM vs data-aware agent over NFL receiving stats")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// CSV file of per-player statistics
    #[arg(long, default_value = "WR.csv", global = true)]
    csv: String,

    /// Model identifier on the Ollama server
    #[arg(long, default_value = "gpt-oss:20b", global = true)]
    model: String,

    /// Base URL of the Ollama daemon
    #[arg(long, default_value = "http://localhost:11434", global = true)]
    base_url: String,

    /// Sampling temperature (0 = most deterministic)
    #[arg(long, default_value_t = 0.0, global = true)]
    temperature: f32,

    /// Show the agent's tool trace
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - only show answers
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the two-question demo (default)
    Demo,
    /// Ask one question through both responders
    Ask {
        /// The question text
        #[arg(trailing_var_arg = true, required = true)]
        question: Vec<String>,
    },
    /// Print the ground-truth answers only (no model required)
    Truth,
    /// Show the tool schema handed to the model
    Schema,
}

fn load_table(path: &str) -> Table {
    match Table::from_path(path) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Failed to load {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

fn make_provider(cli: &Cli) -> OllamaProvider {
    let config = ProviderConfig::ollama()
        .with_base_url(&cli.base_url)
        .with_model(&cli.model);
    match OllamaProvider::new(config) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!("Failed to create provider: {}", e);
            std::process::exit(1);
        }
    }
}

fn agent_config(cli: &Cli) -> AgentConfig {
    AgentConfig {
        verbose: !cli.quiet,
        temperature: cli.temperature,
        ..AgentConfig::default()
    }
}

/// Ground truth for the per-player question, straight from the table.
fn print_player_truth(table: &Table) {
    match table.top_by(PLAYER_COLUMN, TD_COLUMN) {
        Ok(top) => println!(
            "ANSWER: Player with most receiving TDs: {} with {} TDs",
            top.label, top.value
        ),
        Err(e) => {
            eprintln!("Ground truth failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Ground truth for the per-team question.
fn print_team_truth(table: &Table) {
    match table.sum_by(TEAM_COLUMN, TD_COLUMN) {
        Ok(sums) => match sums.first() {
            Some(top) => println!(
                "ANSWER: Team with most receiving TDs: {} with {} TDs",
                top.key, top.total
            ),
            None => {
                eprintln!("Ground truth failed: table holds no rows");
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("Ground truth failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Render one answer block. Quiet mode drops the question echo and the
/// separator, leaving only the answer text.
fn render_answer(question: &str, label: &str, text: &str, quiet: bool) -> String {
    if quiet {
        text.to_string()
    } else {
        format!("\n{}\n\n{}:\n{}\n{}", question, label, text, SEPARATOR)
    }
}

/// Ask the model with no data access and print whatever it says.
async fn direct_response(provider: &OllamaProvider, question: &str, temperature: f32, quiet: bool) {
    let request = statline_llm::CompletionRequest::new(vec![statline_llm::ChatMessage::user(
        question,
    )])
    .with_temperature(temperature);

    match provider.complete(request).await {
        Ok(response) => {
            let text = response.content.unwrap_or_default();
            println!("{}", render_answer(question, "LLM (no data)", &text, quiet));
        }
        Err(e) => {
            eprintln!("LLM call failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Ask the agent, which answers through the table tools.
async fn agent_response(agent: &mut Agent<OllamaProvider>, question: &str, quiet: bool) {
    match agent.ask(question).await {
        Ok(answer) => {
            println!(
                "{}",
                render_answer(question, "LLM with table access", &answer.text, quiet)
            );
        }
        Err(e) => {
            eprintln!("Agent failed: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_demo(cli: &Cli) {
    let table = load_table(&cli.csv);
    let direct = make_provider(cli);
    let mut agent = Agent::with_config(make_provider(cli), table.clone(), agent_config(cli));

    // Per-player cycle
    if !cli.quiet {
        println!("{}", PLAYER_QUESTION);
    }
    print_player_truth(&table);
    direct_response(&direct, PLAYER_QUESTION, cli.temperature, cli.quiet).await;
    agent_response(&mut agent, PLAYER_QUESTION, cli.quiet).await;

    // Per-team cycle
    if !cli.quiet {
        println!("{}", TEAM_QUESTION);
    }
    print_team_truth(&table);
    direct_response(&direct, TEAM_QUESTION, cli.temperature, cli.quiet).await;
    agent_response(&mut agent, TEAM_QUESTION, cli.quiet).await;

    if cli.verbose {
        let usage = agent.usage();
        println!(
            "Agent usage: {} calls, {} tokens",
            usage.total_calls,
            usage.total_tokens()
        );
    }
}

async fn run_ask(cli: &Cli, question: &str) {
    let table = load_table(&cli.csv);
    let direct = make_provider(cli);
    let mut agent = Agent::with_config(make_provider(cli), table, agent_config(cli));

    direct_response(&direct, question, cli.temperature, cli.quiet).await;
    agent_response(&mut agent, question, cli.quiet).await;
}

fn run_truth(cli: &Cli) {
    let table = load_table(&cli.csv);
    println!("{}", PLAYER_QUESTION);
    print_player_truth(&table);
    println!("{}", TEAM_QUESTION);
    print_team_truth(&table);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_traces_by_default() {
        let cli = Cli::try_parse_from(["statline"]).unwrap();
        assert!(agent_config(&cli).verbose);

        let cli = Cli::try_parse_from(["statline", "--quiet"]).unwrap();
        assert!(!agent_config(&cli).verbose);
    }

    #[test]
    fn test_temperature_flag_reaches_agent() {
        let cli = Cli::try_parse_from(["statline", "--temperature", "0.7"]).unwrap();
        assert_eq!(agent_config(&cli).temperature, 0.7);
    }

    #[test]
    fn test_render_answer_echoes_question() {
        let out = render_answer("Which team led?", "LLM (no data)", "TeamX.", false);
        assert!(out.contains("Which team led?"));
        assert!(out.contains("LLM (no data):\nTeamX."));
        assert!(out.contains(SEPARATOR));
    }

    #[test]
    fn test_render_answer_quiet_is_answer_only() {
        let out = render_answer("Which team led?", "LLM (no data)", "TeamX.", true);
        assert_eq!(out, "TeamX.");
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Truth) => {
            run_truth(&cli);
        }
        Some(Commands::Schema) => {
            println!("{}", statline_agent::schema_summary());
        }
        Some(Commands::Ask { question }) => {
            let question = question.join(" ");
            run_ask(&cli, &question).await;
        }
        Some(Commands::Demo) | None => {
            run_demo(&cli).await;
        }
    }
}
