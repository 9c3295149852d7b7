use std::time::Duration;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::MissedTickBehavior;
use tracing::info;

use parley_store::ChannelRepository;
use parley_types::{Channel, Message, User};

use crate::directory::UserDirectory;
use crate::format::format_relative;
use crate::session::Session;

const DEFAULT_CHANNEL_ID: &str = "general";
const DEFAULT_CHANNEL_NAME: &str = "General";

type InputLines = Lines<BufReader<Stdin>>;

/// What a handled input line means for the main loop.
#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    /// Switched into a (possibly new) channel; reprint it.
    Entered,
    /// Posted a message with this id; no need to wait for the next poll.
    Posted(i64),
    Quit,
}

/// Interactive terminal chat client.
///
/// One loop multiplexes stdin lines with a polling ticker that re-reads the
/// store, which is how "live" updates from other writers of the same data
/// directory show up.
pub struct ChatApp {
    repo: ChannelRepository,
    directory: UserDirectory,
    session: Session,
    poll_interval: Duration,
}

impl ChatApp {
    pub fn new(
        repo: ChannelRepository,
        directory: UserDirectory,
        session: Session,
        poll_interval: Duration,
    ) -> Self {
        Self {
            repo,
            directory,
            session,
            poll_interval,
        }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let mut input = BufReader::new(tokio::io::stdin()).lines();

        let user = match self.session.current_user() {
            Some(user) => {
                println!("Welcome back, {} (@{})", user.name, user.username);
                user
            }
            None => self.select_user(&mut input).await?,
        };

        let mut channel_id = self.bootstrap_channel(&user);
        let mut last_seen = self.enter_channel(&channel_id);

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    last_seen = self.print_new_messages(&channel_id, last_seen);
                }
                line = input.next_line() => {
                    let Some(line) = line? else {
                        break; // stdin closed
                    };
                    match self.handle_line(&user, &mut channel_id, line.trim()) {
                        Flow::Continue => {}
                        Flow::Entered => last_seen = self.enter_channel(&channel_id),
                        Flow::Posted(id) => {
                            last_seen = self.print_new_messages(&channel_id, last_seen);
                            last_seen = last_seen.max(id);
                        }
                        Flow::Quit => break,
                    }
                }
            }
        }

        Ok(())
    }

    /// Identity selection screen: list the directory, read an index.
    async fn select_user(&self, input: &mut InputLines) -> anyhow::Result<User> {
        println!("Who are you?");
        for (i, user) in self.directory.users().iter().enumerate() {
            println!("  {}. {} (@{})", i + 1, user.name, user.username);
        }

        loop {
            println!("Pick a number:");
            let Some(line) = input.next_line().await? else {
                anyhow::bail!("stdin closed before a user was selected");
            };
            match line.trim().parse::<usize>() {
                Ok(n) if (1..=self.directory.users().len()).contains(&n) => {
                    let user = self.directory.users()[n - 1].clone();
                    self.session.remember(&user);
                    info!("Selected user {}", user.id);
                    return Ok(user);
                }
                _ => println!("Not a valid choice."),
            }
        }
    }

    /// Pick the starting channel: the oldest one, or a fresh default
    /// channel when nothing is persisted yet.
    fn bootstrap_channel(&self, user: &User) -> String {
        let table = self.repo.get_all();
        if table.is_empty() {
            let channel = self
                .repo
                .create(DEFAULT_CHANNEL_ID, DEFAULT_CHANNEL_NAME, &user.id);
            info!("Created default channel {}", channel.id);
            return channel.id;
        }

        table
            .values()
            .min_by_key(|c| (c.created_at, c.id.clone()))
            .map(|c| c.id.clone())
            .unwrap_or_else(|| DEFAULT_CHANNEL_ID.to_string())
    }

    /// Print a channel header plus its backlog; returns the newest seen
    /// message id.
    fn enter_channel(&self, channel_id: &str) -> i64 {
        let Some(channel) = self.repo.get(channel_id) else {
            println!("Channel {} is gone.", channel_id);
            return 0;
        };

        println!();
        println!(
            "#{} — {} participant(s). /help for commands.",
            channel.name,
            channel.participants.len()
        );
        if channel.messages.is_empty() {
            println!("No messages yet. Start the conversation!");
        }

        let now = Utc::now().timestamp_millis();
        for message in &channel.messages {
            self.print_message(message, now);
        }
        channel.messages.last().map(|m| m.id).unwrap_or(0)
    }

    fn print_message(&self, message: &Message, now_ms: i64) {
        let author = self
            .directory
            .by_id(&message.user_id)
            .map(|u| u.name.as_str())
            .unwrap_or(message.user_id.as_str());
        println!(
            "[{}] {}: {}",
            format_relative(message.timestamp, now_ms),
            author,
            message.text
        );
    }

    /// Print messages that arrived since `last_seen`; returns the new high
    /// water mark.
    fn print_new_messages(&self, channel_id: &str, last_seen: i64) -> i64 {
        let Some(channel) = self.repo.get(channel_id) else {
            return last_seen;
        };

        let now = Utc::now().timestamp_millis();
        let mut newest = last_seen;
        for message in channel.messages.iter().filter(|m| m.id > last_seen) {
            self.print_message(message, now);
            newest = newest.max(message.id);
        }
        newest
    }

    fn handle_line(&self, user: &User, channel_id: &mut String, line: &str) -> Flow {
        if line.is_empty() {
            return Flow::Continue;
        }

        let Some(rest) = line.strip_prefix('/') else {
            return match self.repo.add_message(channel_id, &user.id, line) {
                Some(message) => Flow::Posted(message.id),
                None => {
                    println!("Channel {} no longer exists.", channel_id);
                    Flow::Continue
                }
            };
        };

        let (command, arg) = match rest.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (rest, ""),
        };

        match command {
            "help" => {
                self.print_help();
                Flow::Continue
            }
            "channels" => {
                self.list_channels();
                Flow::Continue
            }
            "create" => {
                if arg.is_empty() {
                    println!("Usage: /create <name>");
                    return Flow::Continue;
                }
                let id = format!("channel-{}", Utc::now().timestamp_millis());
                let channel = self.repo.create(&id, arg, &user.id);
                *channel_id = channel.id;
                Flow::Entered
            }
            "join" => {
                if arg.is_empty() {
                    println!("Usage: /join <channel-id>");
                    return Flow::Continue;
                }
                if !self.repo.add_participant(arg, &user.id) {
                    println!("No channel with id {}.", arg);
                    return Flow::Continue;
                }
                *channel_id = arg.to_string();
                Flow::Entered
            }
            "invite" => {
                self.invite(user, channel_id, arg);
                Flow::Continue
            }
            "kick" => {
                self.kick(user, channel_id, arg);
                Flow::Continue
            }
            "who" => {
                self.list_participants(channel_id);
                Flow::Continue
            }
            "logout" => {
                self.session.forget();
                println!("Identity cleared. Bye!");
                Flow::Quit
            }
            "quit" => Flow::Quit,
            _ => {
                println!("Unknown command /{}. Try /help.", command);
                Flow::Continue
            }
        }
    }

    fn print_help(&self) {
        println!("Commands:");
        println!("  /channels          list all channels");
        println!("  /create <name>     create a channel and switch to it");
        println!("  /join <id>         join a channel by id");
        println!("  /invite <username> add a user (creator only)");
        println!("  /kick <username>   remove a user (creator only)");
        println!("  /who               list participants");
        println!("  /logout            clear saved identity and exit");
        println!("  /quit              exit");
        println!("Anything else is sent as a message.");
    }

    fn list_channels(&self) {
        let table = self.repo.get_all();
        if table.is_empty() {
            println!("No channels yet.");
            return;
        }

        let mut channels: Vec<&Channel> = table.values().collect();
        channels.sort_by_key(|c| c.created_at);
        for channel in channels {
            println!(
                "  {:<24} #{} ({} member(s), {} message(s))",
                channel.id,
                channel.name,
                channel.participants.len(),
                channel.messages.len()
            );
        }
    }

    fn list_participants(&self, channel_id: &str) {
        let Some(channel) = self.repo.get(channel_id) else {
            println!("Channel {} no longer exists.", channel_id);
            return;
        };

        println!("Participants of #{}:", channel.name);
        for id in &channel.participants {
            match self.directory.by_id(id) {
                Some(user) => {
                    let marker = if *id == channel.creator_id {
                        " (creator)"
                    } else {
                        ""
                    };
                    println!("  {} (@{}){}", user.name, user.username, marker);
                }
                None => println!("  {}", id),
            }
        }
    }

    fn invite(&self, user: &User, channel_id: &str, username: &str) {
        if username.is_empty() {
            println!("Usage: /invite <username>");
            return;
        }
        if !self.repo.is_creator(channel_id, &user.id) {
            println!("Only the channel creator can invite users.");
            return;
        }
        let Some(target) = self.directory.by_username(username) else {
            println!("No user named @{}.", username);
            return;
        };
        if self.repo.add_participant(channel_id, &target.id) {
            println!("@{} is in.", target.username);
        } else {
            println!("Channel {} no longer exists.", channel_id);
        }
    }

    fn kick(&self, user: &User, channel_id: &str, username: &str) {
        if username.is_empty() {
            println!("Usage: /kick <username>");
            return;
        }
        if !self.repo.is_creator(channel_id, &user.id) {
            println!("Only the channel creator can remove users.");
            return;
        }
        let Some(target) = self.directory.by_username(username) else {
            println!("No user named @{}.", username);
            return;
        };
        if self.repo.remove_participant(channel_id, &target.id) {
            println!("@{} was removed.", target.username);
        } else {
            println!("Channel {} no longer exists.", channel_id);
        }
    }
}
