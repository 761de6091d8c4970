use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use humility_core::messages::{Message, Role};
use humility_core::provider::CompletionClient;
use humility_engine::{Phase, Session, SessionError};

pub const TITLE: &str = "Fun & Inquisitive Chatbot: Intellectual Humility Assessment";
pub const INTRO: &str = "This chatbot loves to ask fun, inquisitive questions about how you and your friends chat.\n\
After a short conversation (5–10 user messages), the bot will produce an\n\
'Intellectual Humility' assessment of you!";
pub const ANALYSIS_ACTION: &str = "Get my Intellectual Humility assessment now!";
const FAREWELL: &str = "Thank you for chatting! If you'd like to start over, just restart the session.";

/// One line of user input, interpreted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Say(String),
    Analyze,
    History,
    Help,
    Quit,
}

impl Command {
    /// `None` for blank lines, which are ignored. Commands are case-insensitive.
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match trimmed.to_ascii_lowercase().as_str() {
            "/analyze" | "/analyse" => Self::Analyze,
            "/history" => Self::History,
            "/help" => Self::Help,
            "/quit" | "/exit" => Self::Quit,
            _ => Self::Say(line.trim_end_matches(['\r', '\n']).to_string()),
        })
    }
}

/// Terminal front-end: reads one line per action, re-renders after each turn.
pub struct Repl<C, R, W> {
    session: Session<C>,
    input: R,
    output: W,
}

impl<C, R, W> Repl<C, R, W>
where
    C: CompletionClient,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(session: Session<C>, input: R, output: W) -> Self {
        Self {
            session,
            input,
            output,
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }

    /// Run until `/quit` or end of input.
    pub async fn run(&mut self) -> std::io::Result<()> {
        self.print_banner().await?;

        let mut line = String::new();
        loop {
            self.write("\n> ").await?;
            line.clear();
            if self.input.read_line(&mut line).await? == 0 {
                debug!("input closed");
                break;
            }

            let Some(command) = Command::parse(&line) else {
                continue;
            };
            match command {
                Command::Say(text) => self.say(&text).await?,
                Command::Analyze => self.analyze().await?,
                Command::History => self.print_history().await?,
                Command::Help => self.print_help().await?,
                Command::Quit => break,
            }
        }
        self.output.flush().await
    }

    async fn say(&mut self, text: &str) -> std::io::Result<()> {
        let before = self.session.phase();
        match self.session.submit_user_message(text).await {
            Ok(reply) => {
                self.write(&format!("Chatbot: {reply}\n")).await?;
                if before == Phase::Chatting && self.session.phase().allows_analysis() {
                    self.write(&format!("---\n{ANALYSIS_ACTION} (type /analyze)\n")).await?;
                }
                Ok(())
            }
            Err(err) => self.report(&err).await,
        }
    }

    async fn analyze(&mut self) -> std::io::Result<()> {
        if !self.session.phase().allows_analysis() {
            let remaining = self.session.turns_until_analysis();
            return self
                .write(&format!(
                    "Keep chatting! The assessment unlocks after {remaining} more message(s).\n"
                ))
                .await;
        }

        self.write("Analyzing your conversation for intellectual humility...\n").await?;
        let text = match self.session.request_analysis().await {
            Ok(analysis) => analysis.text.clone(),
            Err(err) => return self.report(&err).await,
        };
        self.write(&format!(
            "Analysis Complete!\n\nYour Intellectual Humility Assessment:\n\n{text}\n\n{FAREWELL}\n"
        ))
        .await
    }

    async fn report(&mut self, err: &SessionError) -> std::io::Result<()> {
        let message = match err {
            SessionError::EmptyMessage => "Please type a message first.".to_string(),
            SessionError::AnalysisUnavailable { user_turns, required } => format!(
                "The assessment needs {required} messages from you; you have sent {user_turns}."
            ),
            SessionError::Transport { source, unsent } => {
                let retry = if unsent.is_some() {
                    " Your last message was not sent; type it again to retry."
                } else {
                    " You can try /analyze again."
                };
                format!("Error: {} ({source}).{retry}", source.user_hint())
            }
        };
        self.write(&format!("{message}\n")).await
    }

    async fn print_banner(&mut self) -> std::io::Result<()> {
        self.write(&format!("{TITLE}\n\n{INTRO}\n\nType /help for commands.\n"))
            .await
    }

    async fn print_help(&mut self) -> std::io::Result<()> {
        let mut help = String::from(
            "Commands:\n  /help     show this list\n  /history  show the conversation so far\n",
        );
        if self.session.phase().allows_analysis() {
            help.push_str(&format!("  /analyze  {ANALYSIS_ACTION}\n"));
        }
        help.push_str("  /quit     end the session\n");
        self.write(&help).await
    }

    async fn print_history(&mut self) -> std::io::Result<()> {
        let rendered: String = self
            .session
            .conversation()
            .visible()
            .map(render_message)
            .collect();
        if rendered.is_empty() {
            self.write("(no messages yet)\n").await
        } else {
            self.write(&rendered).await
        }
    }

    async fn write(&mut self, text: &str) -> std::io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await
    }
}

fn render_message(message: &Message) -> String {
    match message.role() {
        Role::Assistant => format!("Chatbot: {}\n", message.content()),
        Role::User => format!("You: {}\n", message.content()),
        Role::System => String::new(),
    }
}
