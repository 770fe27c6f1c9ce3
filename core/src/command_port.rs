//! External command ports.
//!
//! Popup markup lives outside the view, so its buttons cannot hold a
//! reference to it. Instead the view installs a `CommandPort` into a
//! process-wide table under two stable names while it is active, and the
//! markup invokes those names. Dropping the returned `PortGuard` retracts
//! the entries again.

use crate::types::EntityId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub const FOLLOW_PORT: &str = "followUser";
pub const UNFOLLOW_PORT: &str = "unfollowUser";

pub trait CommandPort {
    fn follow(&self, id: &str);
    fn unfollow(&self);
}

/// A parsed call from injected markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortCall {
    Follow(EntityId),
    Unfollow,
}

thread_local! {
    static PORTS: RefCell<HashMap<&'static str, Rc<dyn CommandPort>>> =
        RefCell::new(HashMap::new());
}

/// Keeps a port installed. Retracts its own entries on drop; entries since
/// replaced by another installer are left alone.
#[must_use = "the ports are retracted as soon as the guard is dropped"]
pub struct PortGuard {
    port: Rc<dyn CommandPort>,
    names: Vec<&'static str>,
}

impl PortGuard {
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }
}

impl Drop for PortGuard {
    fn drop(&mut self) {
        PORTS.with(|ports| {
            let mut ports = ports.borrow_mut();
            for name in &self.names {
                if ports.get(name).is_some_and(|p| same_port(p, &self.port)) {
                    ports.remove(name);
                    log::debug!("command port: retracted {name}");
                }
            }
        });
    }
}

/// Install `port` under both the follow and unfollow names.
pub fn install(port: Rc<dyn CommandPort>) -> PortGuard {
    let names = vec![FOLLOW_PORT, UNFOLLOW_PORT];
    PORTS.with(|ports| {
        let mut ports = ports.borrow_mut();
        for name in &names {
            if ports.insert(*name, Rc::clone(&port)).is_some() {
                log::warn!("command port: {name} replaced an existing installation");
            }
        }
    });
    PortGuard { port, names }
}

pub fn is_installed(name: &str) -> bool {
    PORTS.with(|ports| ports.borrow().contains_key(name))
}

/// Call the installed follow port. False when nothing is installed.
pub fn invoke_follow(id: &str) -> bool {
    match lookup(FOLLOW_PORT) {
        Some(port) => {
            port.follow(id);
            true
        }
        None => {
            log::debug!("command port: {FOLLOW_PORT}({id}) with nothing installed");
            false
        }
    }
}

/// Call the installed unfollow port. False when nothing is installed.
pub fn invoke_unfollow() -> bool {
    match lookup(UNFOLLOW_PORT) {
        Some(port) => {
            port.unfollow();
            true
        }
        None => {
            log::debug!("command port: {UNFOLLOW_PORT}() with nothing installed");
            false
        }
    }
}

pub fn dispatch(call: &PortCall) -> bool {
    match call {
        PortCall::Follow(id) => invoke_follow(id),
        PortCall::Unfollow => invoke_unfollow(),
    }
}

/// Parse an inline handler such as `window.followUser('7')` or
/// `window.unfollowUser()` as it appears in popup markup.
pub fn parse_invocation(handler: &str) -> Option<PortCall> {
    let call = decode_entities(handler.trim());
    let call = call.strip_prefix("window.").unwrap_or(&call);
    let call = call.strip_suffix(';').unwrap_or(call).trim_end();

    let (name, rest) = call.split_once('(')?;
    let args = rest.strip_suffix(')')?.trim();

    match name.trim() {
        n if n == UNFOLLOW_PORT && args.is_empty() => Some(PortCall::Unfollow),
        n if n == FOLLOW_PORT => {
            let quoted = args
                .strip_prefix('\'')
                .and_then(|a| a.strip_suffix('\''))
                .or_else(|| args.strip_prefix('"').and_then(|a| a.strip_suffix('"')))?;
            Some(PortCall::Follow(unescape_js(quoted)))
        }
        _ => None,
    }
}

fn lookup(name: &str) -> Option<Rc<dyn CommandPort>> {
    // Clone out so the port can itself install or retract.
    PORTS.with(|ports| ports.borrow().get(name).cloned())
}

fn same_port(a: &Rc<dyn CommandPort>, b: &Rc<dyn CommandPort>) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

fn decode_entities(raw: &str) -> String {
    raw.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn unescape_js(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
