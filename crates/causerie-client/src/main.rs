//! Terminal client for Causerie.
//!
//! Wires the synchronizer, the realtime channel and the typing debouncer
//! into a line-oriented REPL. All chat state lives in the synchronizer;
//! this binary only reads commands, forwards events and renders.

mod config;
mod view;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use causerie_api::{ApiClient, ProfileUpdate, StaticToken};
use causerie_realtime::spawn_channel;
use causerie_shared::constants::TYPING_DEBOUNCE_MS;
use causerie_shared::{ConversationKey, DeliveryStatus, GroupId, MessageBody, UserRef};
use causerie_sync::{MessageSearch, Session, Synchronizer, TypingDebouncer};

use config::Config;

/// Interactive state that lives outside the synchronizer: the search
/// cursor, a failed image attachment kept for retry, and fingerprints of
/// what has already been printed.
struct Repl {
    sync: Synchronizer,
    debouncer: TypingDebouncer,
    search: Option<MessageSearch>,
    pending_image: Option<(String, Vec<u8>)>,
    printed: (Option<ConversationKey>, Vec<(i64, DeliveryStatus)>),
    typing_shown: bool,
    unread: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "causerie=info,causerie_sync=info,causerie_realtime=info,causerie_api=warn",
            )
        }))
        .init();

    let config = Config::from_env();
    if config.auth_token.is_empty() {
        bail!("AUTH_TOKEN is not set; sign in and export the credential first");
    }

    let api = ApiClient::new(
        &config.api_base_url,
        Arc::new(StaticToken::new(&config.auth_token)),
    )
    .context("building API client")?;
    let (command_tx, mut event_rx) = spawn_channel(&config.socket_url)
        .await
        .context("connecting realtime channel")?;
    let session = Session::sign_in(&api, &config.auth_token, command_tx)
        .await
        .context("credential rejected, sign in again")?;

    let mut sync = Synchronizer::new(session, api);
    if let Err(e) = sync.initialize(config.peer.as_ref()).await {
        warn!(error = %e, "Initial load failed");
        println!("Could not load conversations: {e}");
        println!("Commands still work; /reload to try again.");
    } else {
        print!("{}", view::sidebar(&sync.state));
    }
    println!("Type /help for commands.");

    let (debouncer, mut typing_rx) =
        TypingDebouncer::spawn(Duration::from_millis(TYPING_DEBOUNCE_MS));
    let unread = view::unread_total(&sync.state);
    let mut repl = Repl {
        sync,
        debouncer,
        search: None,
        pending_image: None,
        printed: (None, Vec::new()),
        typing_shown: false,
        unread,
    };
    let mut lines: Lines<BufReader<Stdin>> = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line.context("reading stdin")? {
                    Some(line) => line,
                    None => break,
                };
                match repl.handle_line(line.trim()).await {
                    Ok(true) => break,
                    Ok(false) => {}
                    Err(e) => println!("error: {e:#}"),
                }
            }
            event = event_rx.recv() => {
                match event {
                    Some(event) => {
                        repl.sync.handle_event(event).await;
                        repl.render_updates();
                    }
                    None => {
                        println!("Realtime channel closed; exiting.");
                        break;
                    }
                }
            }
            value = typing_rx.recv() => {
                if let Some(is_typing) = value {
                    if let Err(e) = repl.sync.emit_typing(is_typing).await {
                        warn!(error = %e, "Failed to emit typing signal");
                    }
                }
            }
        }
    }

    repl.sync.sign_out().await;
    Ok(())
}

impl Repl {
    /// Handle one input line. Returns `true` on quit.
    async fn handle_line(&mut self, line: &str) -> Result<bool> {
        if line.is_empty() {
            return Ok(false);
        }
        if !line.starts_with('/') {
            self.send_text(line).await?;
            return Ok(false);
        }

        let (cmd, rest) = match line.split_once(' ') {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };
        match cmd {
            "/help" => print_help(),
            "/quit" => return Ok(true),
            "/chats" | "/groups" => print!("{}", view::sidebar(&self.sync.state)),
            "/reload" => {
                self.sync.refresh_roster().await?;
                print!("{}", view::sidebar(&self.sync.state));
            }
            "/open" => {
                let key = self.nth_chat(rest)?;
                self.open(key).await?;
            }
            "/group" => {
                let key = self.nth_group(rest)?;
                self.open(key).await?;
            }
            "/start" => {
                let uid = UserRef::from(rest);
                self.sync.initialize(Some(&uid)).await?;
                self.print_thread();
            }
            "/image" => self.attach_image(rest).await?,
            "/retry" => self.send_pending_image().await?,
            "/search" => {
                self.search = self
                    .sync
                    .open()
                    .view()
                    .map(|v| MessageSearch::new(rest, &v.messages));
                self.print_thread();
            }
            "/next" => {
                if let Some(search) = self.search.as_mut() {
                    search.next();
                }
                self.print_thread();
            }
            "/prev" => {
                if let Some(search) = self.search.as_mut() {
                    search.prev();
                }
                self.print_thread();
            }
            "/users" => {
                for user in self.sync.api().all_users().await? {
                    let dot = if user.online { "●" } else { "○" };
                    println!("  {} {} ({})", dot, user.name, user.uid);
                }
            }
            "/members" => {
                let id = self.open_group()?;
                for member in self.sync.api().group_members(id).await? {
                    println!("  {} ({})", member.name, member.uid);
                }
            }
            "/gcreate" => {
                let mut parts = rest.split_whitespace();
                let name = parts.next().context("usage: /gcreate <name> <uid>...")?;
                let members: Vec<UserRef> = parts.map(UserRef::from).collect();
                let group = self.sync.api().create_group(name, &members).await?;
                println!("Created group {} (#{})", group.name, group.id);
                self.sync.refresh_roster().await?;
            }
            "/grename" => {
                let id = self.open_group()?;
                self.sync.api().rename_group(id, rest).await?;
                self.sync.refresh_roster().await?;
            }
            "/gavatar" => {
                let id = self.open_group()?;
                self.sync.api().set_group_avatar(id, rest).await?;
                self.sync.refresh_roster().await?;
            }
            "/gadd" => {
                let id = self.open_group()?;
                self.sync.api().add_member(id, &UserRef::from(rest)).await?;
                self.sync.refresh_roster().await?;
            }
            "/gremove" => {
                let id = self.open_group()?;
                self.sync
                    .api()
                    .remove_member(id, &UserRef::from(rest))
                    .await?;
                self.sync.refresh_roster().await?;
            }
            "/profile" => {
                let profile = self.sync.api().get_profile().await?;
                println!("{profile:#?}");
            }
            "/set" => {
                let (field, value) = rest
                    .split_once(' ')
                    .context("usage: /set <field> <value>")?;
                let update = profile_update(field, value.trim())?;
                self.sync.api().update_profile(&update).await?;
                println!("Profile updated.");
            }
            _ => println!("Unknown command {cmd}; /help for the list."),
        }
        Ok(false)
    }

    async fn open(&mut self, key: ConversationKey) -> Result<()> {
        self.search = None;
        self.sync.select_conversation(key).await?;
        self.print_thread();
        Ok(())
    }

    async fn send_text(&mut self, text: &str) -> Result<()> {
        self.debouncer.input(true);
        self.sync
            .send_message(MessageBody::Text(text.to_string()))
            .await?;
        self.debouncer.input(false);
        Ok(())
    }

    /// Read a file and try to upload-and-send it. On upload failure the
    /// attachment is kept so /retry can re-send without re-reading.
    async fn attach_image(&mut self, path: &str) -> Result<()> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {path}"))?;
        let filename = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        self.pending_image = Some((filename, bytes));
        self.send_pending_image().await
    }

    async fn send_pending_image(&mut self) -> Result<()> {
        let (filename, bytes) = self
            .pending_image
            .as_ref()
            .context("no pending attachment; /image <path> first")?;

        let url = match self.sync.api().upload_media(filename, bytes.clone()).await {
            Ok(url) => url,
            Err(e) => {
                println!("Upload failed: {e}. Attachment kept; /retry to try again.");
                return Ok(());
            }
        };
        self.sync.send_message(MessageBody::Image { url }).await?;
        self.pending_image = None;
        Ok(())
    }

    fn nth_chat(&self, arg: &str) -> Result<ConversationKey> {
        let n: usize = arg.parse().context("usage: /open <number>")?;
        let entry = self
            .sync
            .state
            .chats
            .get(n.checked_sub(1).context("numbering starts at 1")?)
            .context("no such chat; /chats for the list")?;
        Ok(ConversationKey::Direct(entry.id))
    }

    fn nth_group(&self, arg: &str) -> Result<ConversationKey> {
        let n: usize = arg.parse().context("usage: /group <number>")?;
        let entry = self
            .sync
            .state
            .groups
            .get(n.checked_sub(1).context("numbering starts at 1")?)
            .context("no such group; /groups for the list")?;
        Ok(ConversationKey::Group(entry.id))
    }

    fn open_group(&self) -> Result<GroupId> {
        match self.sync.open().key() {
            Some(ConversationKey::Group(id)) => Ok(id),
            _ => bail!("open a group first (/group <number>)"),
        }
    }

    fn print_thread(&mut self) {
        print!("{}", view::thread(&self.sync.state, self.search.as_ref()));
        let open_view = self.sync.open().view();
        self.printed = (
            open_view.map(|v| v.key),
            open_view
                .map(|v| view::thread_fingerprint(&v.messages))
                .unwrap_or_default(),
        );
        self.typing_shown = false;
    }

    /// Print whatever a realtime event changed: the open thread,
    /// typing-bubble transitions and unread-count changes.
    fn render_updates(&mut self) {
        if let Some(open_view) = self.sync.open().view() {
            if self.printed.0 != Some(open_view.key) {
                self.print_thread();
            } else {
                match view::thread_delta(&self.printed.1, &open_view.messages) {
                    // A refresh rewrote existing rows (replaced snapshot
                    // or tick transition); re-print from scratch.
                    view::ThreadDelta::Replaced => self.print_thread(),
                    view::ThreadDelta::Append(from) => {
                        for msg in &open_view.messages[from..] {
                            println!(
                                "{}",
                                view::message_line(msg, &self.sync.state.identity.uid, false)
                            );
                        }
                        self.printed.1 = view::thread_fingerprint(&open_view.messages);
                    }
                    view::ThreadDelta::Unchanged => {}
                }
            }
        }

        let unread = view::unread_total(&self.sync.state);
        if unread != self.unread {
            self.unread = unread;
            println!("Unread conversations: {unread}; /chats for the list.");
        }

        let typing_now = self
            .sync
            .state
            .typing
            .as_ref()
            .map(|sig| sig.is_typing)
            .unwrap_or(false);
        if typing_now && !self.typing_shown {
            if let Some(sig) = &self.sync.state.typing {
                println!("{} is typing…", sig.uid);
            }
        }
        self.typing_shown = typing_now;
    }
}

fn profile_update(field: &str, value: &str) -> Result<ProfileUpdate> {
    let value = Some(value.to_string());
    let mut update = ProfileUpdate::default();
    match field {
        "name" => update.name = value,
        "phone" => update.phone = value,
        "gender" => update.gender = value,
        "dob" => update.dob = value,
        "bio" => update.bio = value,
        "avatar" => update.avatar = value,
        _ => bail!("unknown field {field} (name, phone, gender, dob, bio, avatar)"),
    }
    Ok(update)
}

fn print_help() {
    println!(
        "\
  <text>            send a message into the open conversation
  /chats            list conversations
  /open <n>         open the n-th chat
  /group <n>        open the n-th group
  /start <uid>      start or open a direct chat with a user
  /image <path>     upload an image and send it
  /retry            retry a failed image upload
  /search <query>   search the open conversation
  /next, /prev      move between search matches
  /users            list all registered users
  /members          list members of the open group
  /gcreate <name> <uid>...   create a group
  /grename <name>   rename the open group
  /gavatar <url>    set the open group's avatar
  /gadd <uid>       add a member to the open group
  /gremove <uid>    remove a member from the open group
  /profile          show your profile
  /set <field> <v>  update a profile field
  /reload           re-fetch the conversation lists
  /quit             sign out and exit"
    );
}
