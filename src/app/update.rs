use std::time::Instant;

use crate::app::Model;
use crate::app::model::Phase;
use crate::fetch::FetchError;
use crate::links::LinkAction;
use crate::location::{DOC_PARAM, Location};
use crate::ui::ActiveSection;

/// All possible events and actions in the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Selection
    /// Select a document by id (sidebar click)
    Select(String),
    /// A fetch finished for the given generation
    DocumentLoaded {
        generation: u64,
        doc_id: String,
        result: Result<String, FetchError>,
    },

    // Navigation
    /// Follow an href found in the current document
    FollowLink(Option<String>),
    /// Go back in the address bar history
    Back,
    /// Go forward in the address bar history
    Forward,

    // Content
    /// Copy the code block at this index
    CopyCode { index: usize, at: Instant },
    /// Time passed; expire transient feedback
    Tick(Instant),
    /// The active section tracker reported a new state
    Scrolled(ActiveSection),
}

/// Pure function that updates the model based on a message.
///
/// Fetching and clipboard access happen elsewhere; this only records what
/// the next view should be.
pub fn update(mut model: Model, msg: Message) -> Model {
    match msg {
        Message::Select(id) => {
            if model.site.document(&id).is_none() {
                tracing::warn!(doc = %id, "ignoring selection of unknown document");
                return model;
            }
            if id != model.selected || model.phase != Phase::Ready {
                push_location(&mut model, &id, None);
                model.begin_load(&id);
            }
        }
        Message::DocumentLoaded {
            generation,
            doc_id,
            result,
        } => {
            if generation != model.generation || doc_id != model.selected {
                tracing::debug!(
                    doc = %doc_id,
                    generation,
                    current = model.generation,
                    "discarding stale document"
                );
                return model;
            }
            match result {
                Ok(markdown) => {
                    model.show(markdown);
                    model.phase = Phase::Ready;
                }
                Err(err) => {
                    model.show_fallback();
                    model.phase = Phase::Failed(err);
                }
            }
        }

        Message::FollowLink(href) => {
            let link = model.resolve_link(href.as_deref());
            match link.action() {
                LinkAction::SelectDocument { doc_id, fragment } => {
                    push_location(&mut model, &doc_id, fragment.as_deref());
                    if doc_id != model.selected || model.phase != Phase::Ready {
                        model.begin_load(&doc_id);
                    }
                    model.scroll_target = fragment;
                }
                LinkAction::ScrollTo(id) => {
                    model.scroll_target = Some(id);
                }
                // Opening is a side effect handled by the viewer.
                LinkAction::Open(_) | LinkAction::Inert => {}
            }
        }
        Message::Back => {
            let location = model.history.back().cloned();
            restore_location(&mut model, location);
        }
        Message::Forward => {
            let location = model.history.forward().cloned();
            restore_location(&mut model, location);
        }

        Message::CopyCode { index, at } => {
            if let Some(button) = model.copy_buttons.get_mut(index) {
                button.press(at);
                model.show_toast("Copied code block", at);
            }
        }
        Message::Tick(now) => {
            for button in &mut model.copy_buttons {
                button.tick(now);
            }
            model.expire_toast(now);
        }
        Message::Scrolled(active) => {
            model.active = active;
        }
    }
    model
}

/// Show whatever a history entry names, reloading only if the document changed.
fn restore_location(model: &mut Model, location: Option<Location>) {
    let Some(location) = location else {
        return;
    };
    let id = model.site.initial_doc(&location).to_string();
    if id != model.selected {
        model.begin_load(&id);
    }
    model.scroll_target = location.fragment();
}

/// Record a navigation to `id` in the address bar, unless it is already there.
fn push_location(model: &mut Model, id: &str, fragment: Option<&str>) {
    let current = model.location();
    if current.query_param(DOC_PARAM).as_deref() == Some(id) && current.fragment().as_deref() == fragment {
        return;
    }
    let next = current
        .clone()
        .with_query_param(DOC_PARAM, id)
        .with_fragment(fragment);
    model.history.push(next);
}
