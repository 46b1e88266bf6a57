//! Question answering command

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_status, is_sentinel, print_warning, OutputFormat};

/// Row for the answer table
#[derive(Tabled)]
struct AnswerRow {
    #[tabled(rename = "Query")]
    query: String,
    #[tabled(rename = "Answer")]
    answer: String,
}

/// Ask the agent one question
pub async fn ask(client: &ApiClient, words: &[String], format: OutputFormat) -> Result<()> {
    let query = words.join(" ");
    if query.trim().is_empty() {
        anyhow::bail!("Question must not be empty");
    }

    let response = client.ask(&query).await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&response)?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            // Multi-line answers (logs) read better outside a table
            if response.answer.contains('\n') {
                println!("{}", response.query.bold());
                println!("{}", "-".repeat(60));
                println!("{}", response.answer);
                return Ok(());
            }

            let row = AnswerRow {
                query: response.query.clone(),
                answer: color_status(&response.answer).bold().to_string(),
            };
            let table = tabled::Table::new([row])
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);

            if is_sentinel(&response.answer) {
                print_warning("The agent could not answer from cluster data");
            }
        }
    }

    Ok(())
}
