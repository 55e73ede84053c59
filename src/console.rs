//! Operator input. Lines are read on a plain thread and handed over through a
//! channel, so a pending read never holds up runtime shutdown on Ctrl-C.

use std::io::{BufRead, Write};

use tokio::sync::mpsc;
use tracing::{debug, warn};

pub struct Console {
    lines: mpsc::Receiver<String>,
}

impl Console {
    pub fn stdin() -> Self {
        Self::spawn(std::io::BufReader::new(std::io::stdin()))
    }

    /// Reads `reader` line by line on a detached thread.
    pub fn spawn<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = mpsc::channel(1);
        std::thread::spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to read input");
                        break;
                    }
                }
            }
            debug!("input closed");
        });
        Self { lines: rx }
    }

    /// Next line, `None` once input is closed.
    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await
    }

    /// Shows `prompt` and waits for the answer.
    pub async fn ask(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
        print!("{}", prompt);
        std::io::stdout().flush()?;
        Ok(self.next_line().await)
    }
}
