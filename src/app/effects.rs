use std::io::{Write, stdout};

use base64::Engine;

use crate::app::{Message, Viewer};
use crate::fetch::Transport;
use crate::links::LinkAction;

impl<T: Transport + 'static> Viewer<T> {
    /// Run the side effects a message implies, after the model has seen it.
    pub(super) fn handle_message_side_effects(&mut self, msg: &Message) {
        match msg {
            Message::FollowLink(href) => {
                if let LinkAction::Open(url) = self.model.resolve_link(href.as_deref()).action() {
                    self.open_link(&url);
                }
            }
            Message::CopyCode { index, .. } => {
                let Some(block) = self.model.rendered.code_blocks.get(*index) else {
                    return;
                };
                if self.clipboard_enabled {
                    // Fire and forget: a terminal without OSC 52 just ignores it.
                    if let Err(err) = copy_to_clipboard(&block.code) {
                        tracing::debug!(error = %err, "clipboard write failed");
                    }
                }
            }
            Message::DocumentLoaded {
                generation, doc_id, ..
            } => {
                if *generation == self.model.generation && *doc_id == self.model.selected {
                    self.layout_current_document();
                }
            }
            _ => {}
        }
        self.request_pending_load();
        self.bring_scroll_target_into_view();
    }

    fn open_link(&self, url: &str) {
        if !self.open_links {
            tracing::info!(%url, "external link");
            return;
        }
        if let Err(err) = open_external_link(url) {
            tracing::warn!(%url, error = %err, "failed to open link");
        }
    }
}

fn open_external_link(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()?
            .wait()?;
        Ok(())
    }
    #[cfg(target_os = "windows")]
    {
        use std::process::Stdio;
        std::process::Command::new("cmd")
            .args(["/C", "start", "", url])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        return Ok(());
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()?
            .wait()?;
        Ok(())
    }
}

fn copy_to_clipboard(text: &str) -> std::io::Result<()> {
    let osc = osc52_sequence(text);
    let mut out = stdout();
    out.write_all(osc.as_bytes())?;
    out.flush()
}

fn osc52_sequence(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x07")
}
