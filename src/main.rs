use clap::{Parser, Subcommand};
use std::io::Write;
use tracing_subscriber::EnvFilter;

use reverie::engine::ChatEngine;

#[derive(Parser)]
#[command(name = "reverie")]
#[command(about = "A persona-driven chat agent with layered memory retrieval")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat,

    /// Send a single message and print the reply
    Ask {
        /// The message to send
        text: String,
    },

    /// Re-partition dialogue memory into the short-term window and archive
    Compact,

    /// Show which memories a query would resurface
    Recall {
        /// Query text
        query: String,
    },

    /// Look up unfamiliar terms in external knowledge sources
    Lookup {
        /// Text to extract keywords from
        text: String,
    },

    /// Store a note in raw vector memory
    Remember {
        /// Note text
        text: String,

        /// Emotional weight attached to the note
        #[arg(long, default_value_t = 0.0)]
        emotion_score: f32,
    },

    /// Show memory store counts
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = reverie::config::load()?;
    let engine = ChatEngine::new(&config)?;

    match cli.command {
        Commands::Chat => run_repl(&engine).await,
        Commands::Ask { text } => {
            match engine.turn(&text).await {
                Ok(reply) => println!("{reply}"),
                Err(e) => eprintln!("error: {e}"),
            }
            Ok(())
        }
        Commands::Compact => {
            let report = engine.compact();
            println!(
                "short-term: {} turns, newly archived: {}",
                report.kept_turns, report.archived
            );
            Ok(())
        }
        Commands::Recall { query } => {
            let echoes = engine.recall(&query);
            if echoes.is_empty() {
                println!("nothing resurfaced");
            }
            for echo in echoes {
                println!("[{:?}] {}", echo.origin, echo.content);
            }
            Ok(())
        }
        Commands::Lookup { text } => {
            match engine.lookup(&text).await {
                Some(summary) => println!("{summary}"),
                None => println!("no result"),
            }
            Ok(())
        }
        Commands::Remember {
            text,
            emotion_score,
        } => {
            engine.remember(&text, emotion_score)?;
            println!("remembered");
            Ok(())
        }
        Commands::Status => {
            let status = engine.status();
            println!("reverie v{}", env!("CARGO_PKG_VERSION"));
            println!("dialogue entries:    {}", status.dialogue_entries);
            println!("journal entries:     {}", status.journal_entries);
            println!("short-term messages: {}", status.short_term_messages);
            println!("long-term items:     {}", status.long_term_items);
            println!("vector memories:     {}", status.vector_memories);
            println!(
                "knowledge cache:     {}",
                if status.knowledge_cached {
                    "present"
                } else {
                    "empty"
                }
            );
            Ok(())
        }
    }
}

async fn run_repl(engine: &ChatEngine) -> anyhow::Result<()> {
    let name = engine.persona_name().to_string();
    println!("{name} is listening. Type 'exit' to leave.");

    let stdin = std::io::stdin();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "exit" || input == "quit" {
            break;
        }

        match engine.turn(input).await {
            Ok(reply) => println!("{name}> {reply}"),
            Err(e) => eprintln!("error: {e}"),
        }
    }

    Ok(())
}
