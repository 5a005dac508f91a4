//! In-memory stand-ins for the chat host and the portal session.

use crate::chat::{Channel, ChatHost, Member, MessageRef};
use crate::domain::{ChannelId, MessageId, ServerId, UserId};
use crate::error::{ConnectionError, HostError};
use crate::portal::{Browser, Form, Page};
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

pub const SERVER_CHANNEL: &str = "100";
pub const DM_CHANNEL: &str = "200";

#[derive(Default)]
pub struct FakeHost {
    members: BTreeSet<String>,
    fail_broadcasts: bool,
    sent: Mutex<Vec<(String, String)>>,
    reactions: Mutex<Vec<(MessageRef, String)>>,
    ready_calls: AtomicUsize,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_members(mut self, ids: &[&str]) -> Self {
        self.members = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn failing_broadcasts(mut self) -> Self {
        self.fail_broadcasts = true;
        self
    }

    pub fn channel(&self) -> ChannelId {
        ChannelId::new(SERVER_CHANNEL).unwrap()
    }

    /// `(destination, text)` pairs, `channel:<id>` or `user:<id>`.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn reactions(&self) -> Vec<(MessageRef, String)> {
        self.reactions.lock().unwrap().clone()
    }

    pub fn ready_calls(&self) -> usize {
        self.ready_calls.load(Ordering::SeqCst)
    }

    fn message(&self, channel: ChannelId) -> MessageRef {
        let id = self.sent.lock().unwrap().len() + 1;
        MessageRef {
            channel,
            id: MessageId::new(id.to_string()).unwrap(),
        }
    }
}

impl ChatHost for FakeHost {
    async fn wait_until_ready(&self) -> Result<(), HostError> {
        self.ready_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_channel(&self, id: &ChannelId) -> Result<Option<Channel>, HostError> {
        Ok(match id.as_str() {
            SERVER_CHANNEL => Some(Channel {
                id: id.clone(),
                server: Some(ServerId::new("1").unwrap()),
            }),
            DM_CHANNEL => Some(Channel {
                id: id.clone(),
                server: None,
            }),
            _ => None,
        })
    }

    async fn send_message(&self, channel: &ChannelId, text: &str) -> Result<MessageRef, HostError> {
        if self.fail_broadcasts {
            return Err(HostError::Status {
                status: 500,
                body: "broadcast refused".to_string(),
            });
        }
        let message = self.message(channel.clone());
        self.sent
            .lock()
            .unwrap()
            .push((format!("channel:{channel}"), text.to_string()));
        Ok(message)
    }

    async fn add_reaction(&self, message: &MessageRef, emoji: &str) -> Result<(), HostError> {
        self.reactions
            .lock()
            .unwrap()
            .push((message.clone(), emoji.to_string()));
        Ok(())
    }

    async fn get_member(&self, _server: &ServerId, user: &UserId) -> Result<Option<Member>, HostError> {
        Ok(self
            .members
            .contains(user.as_str())
            .then(|| Member { user: user.clone() }))
    }

    async fn send_direct_message(&self, user: &UserId, text: &str) -> Result<MessageRef, HostError> {
        let message = self.message(ChannelId::new(DM_CHANNEL).unwrap());
        self.sent
            .lock()
            .unwrap()
            .push((format!("user:{user}"), text.to_string()));
        Ok(message)
    }
}

/// Serves canned bodies by absolute URL; anything else is a 404.
#[derive(Default)]
pub struct FakeBrowser {
    pages: HashMap<String, String>,
    opened: Mutex<Vec<String>>,
    submitted: AtomicUsize,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }
}

impl Browser for FakeBrowser {
    async fn open(&self, url: &Url) -> Result<Page, ConnectionError> {
        self.opened.lock().unwrap().push(url.to_string());
        match self.pages.get(url.as_str()) {
            Some(body) => Ok(Page::new(url.clone(), body.clone())),
            None => Err(ConnectionError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }

    async fn submit(&self, form: &Form) -> Result<Page, ConnectionError> {
        self.submitted.fetch_add(1, Ordering::SeqCst);
        Ok(Page::new(form.action().clone(), "<p>welcome</p>"))
    }
}

/// Portal pages for a login form, a listing and one detail page per course.
pub fn portal_pages(base: &str, courses: &[(&str, &[&str])]) -> FakeBrowser {
    let listing_url = format!("{base}/cours.php");
    let mut rows = String::new();
    for (index, (course, _)) in courses.iter().enumerate() {
        rows.push_str(&format!(
            r#"<tr><td>{course}</td><td><a href="detail.php?c={index}">Consulter</a></td></tr>"#
        ));
    }

    // The first visit gets the login form; the fake serves the same body for
    // both visits, so the listing carries the form as well.
    let listing = format!(
        r#"<form id="authentification" method="post" action="login.php">
             <input name="username"><input type="password" name="password">
           </form>
           <div id="contenu_principal"><table><tbody>{rows}</tbody></table></div>"#
    );
    let mut browser = FakeBrowser::new().with_page(&listing_url, &listing);

    for (index, (_, items)) in courses.iter().enumerate() {
        let rows: String = items
            .iter()
            .map(|item| format!("<tr><td>{item}</td><td>-</td></tr>"))
            .chain(std::iter::once(
                r#"<tr class="footer"><td>Total</td><td>-</td></tr>"#.to_string(),
            ))
            .collect();
        browser = browser.with_page(
            &format!("{base}/detail.php?c={index}"),
            &format!(r#"<div id="contenu_principal"><table><tbody>{rows}</tbody></table></div>"#),
        );
    }
    browser
}
