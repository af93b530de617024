use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use simona_proxy::protocol::RESPONSE_END;

#[derive(Parser)]
#[command(name = "reader-cli")]
#[command(about = "Send reader commands to a running simona-proxy", long_about = None)]
struct Cli {
    /// Proxy address.
    #[arg(short, long, default_value = "127.0.0.1:4001")]
    addr: String,

    /// Reader name sent on the first line.
    #[arg(short, long, default_value = "Simona1")]
    reader: String,

    /// Seconds to wait for all replies.
    #[arg(short, long, default_value_t = 10)]
    timeout_secs: u64,

    /// Commands as ID:NAME[:HEXDATA], e.g. 1:APDU:00A4040300 2:RESET
    #[arg(required = true)]
    commands: Vec<String>,
}

fn build_request(reader: &str, commands: &[String]) -> String {
    let mut request = format!(">{}|\n", reader);
    for command in commands {
        request.push_str(&format!(">{}|\n", command));
    }
    request
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let stream = TcpStream::connect(&cli.addr).await?;
    let (read_half, mut write_half) = stream.into_split();

    let request = build_request(&cli.reader, &cli.commands);
    write_half.write_all(request.as_bytes()).await?;

    let mut lines = BufReader::new(read_half).lines();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(cli.timeout_secs);
    let mut received = 0;

    while received < cli.commands.len() {
        match tokio::time::timeout_at(deadline, lines.next_line()).await {
            Ok(Ok(Some(line))) => {
                if line.ends_with(RESPONSE_END) {
                    received += 1;
                }
                println!("{}", line);
            }
            Ok(Ok(None)) => {
                eprintln!("Error: proxy closed the connection");
                break;
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                eprintln!(
                    "Error: timed out with {} of {} replies",
                    received,
                    cli.commands.len()
                );
                break;
            }
        }
    }

    Ok(())
}
