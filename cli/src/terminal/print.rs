// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use std::{cell::Cell, fmt::Display, net::SocketAddr, sync::OnceLock};

use crate::terminal::{banner, colors};
use anyhow::bail;
use colored::*;
use pfwd_common::{
    config::Config,
    models::{listing::Listing, profile::RuleProfile, rule::PortRule, status::PortStatus},
};
use unicode_width::UnicodeWidthStr;

pub const TOTAL_WIDTH: usize = 64;

static PRINT: OnceLock<Print> = OnceLock::new();

thread_local! {
    pub static GLOBAL_KEY_WIDTH: Cell<usize> = const { Cell::new(0) }
}

type Detail = (String, ColoredString);

#[macro_export]
macro_rules! pprint {
    () => {
        $crate::pprint!("");
    };
    ($($arg:tt)*) => {
        tracing::info!(
            target: "pfwd::print",
            raw_msg = %format_args!($($arg)*)
        );
    };
}

pub trait WithDefaultColor {
    fn with_default(self, default_color: Color) -> ColoredString;
}

impl WithDefaultColor for &str {
    fn with_default(self, default_color: Color) -> ColoredString {
        self.color(default_color)
    }
}

impl WithDefaultColor for String {
    fn with_default(self, default_color: Color) -> ColoredString {
        self.color(default_color)
    }
}

impl WithDefaultColor for ColoredString {
    fn with_default(self, _default_color: Color) -> ColoredString {
        self
    }
}

pub struct Print {
    no_banner: bool,
    q_level: u8,
}

impl Print {
    fn new(cfg: &Config) -> Self {
        Self {
            no_banner: cfg.no_banner,
            q_level: cfg.quiet,
        }
    }

    pub fn init(cfg: &Config) -> anyhow::Result<()> {
        let term = Self::new(cfg);
        if PRINT.set(term).is_err() {
            bail!("terminal has already been initialized")
        }
        Ok(())
    }

    fn get() -> &'static Self {
        PRINT.get_or_init(|| Self::new(&Config::default()))
    }

    pub fn is_raw() -> bool {
        Self::get().q_level >= 2
    }

    pub fn banner() {
        let p = Self::get();
        if p.no_banner || p.q_level > 0 {
            return;
        }

        let text_content: String = format!("⟦ PFWD v{} ⟧ ", env!("CARGO_PKG_VERSION"));
        let text_width: usize = UnicodeWidthStr::width(text_content.as_str());
        let text: ColoredString = text_content.bright_green().bold();
        let sep: ColoredString = "═"
            .repeat(TOTAL_WIDTH.saturating_sub(text_width) / 2)
            .bright_black();
        let output: String = format!("{}{}{}", sep, text, sep);

        pprint!("{}", output);
        banner::print();
    }

    pub fn header(msg: &str) {
        let p = Self::get();
        if p.q_level > 1 {
            return;
        }
        if p.q_level > 0 {
            pprint!();
            return;
        }

        let formatted: String = format!("⟦ {} ⟧", msg);
        let msg_len: usize = formatted.chars().count();

        let dash_count: usize = TOTAL_WIDTH.saturating_sub(msg_len);
        let left: usize = dash_count / 2;
        let right: usize = dash_count - left;

        let line: ColoredString = format!(
            "{}{}{}",
            "─".repeat(left),
            formatted.to_uppercase().bright_green(),
            "─".repeat(right)
        )
        .bright_black();

        pprint!("{}", line);
    }

    /// The live table. `-qq` prints `family listen target` per line.
    pub fn listing(listing: &Listing) {
        let p = Self::get();
        if p.q_level >= 2 {
            for rule in listing.rules() {
                pprint!("{} {} {}", rule.protocol.token(), rule.listen, rule.target);
            }
            return;
        }

        if listing.rules().is_empty() {
            Self::empty("no forwarding rules are active");
        }
        for (idx, rule) in listing.rules().iter().enumerate() {
            let family: String = if rule.family_guessed {
                format!("{} (guessed)", rule.protocol)
            } else {
                rule.protocol.to_string()
            };
            rule_line(idx, &rule.listen, &rule.target, &family);
        }
        for warning in listing.warnings() {
            pfwd_common::warn!("{warning}");
        }
    }

    /// Rules of a stored profile.
    pub fn rules(rules: &[PortRule]) {
        if Self::is_raw() {
            for rule in rules {
                pprint!(
                    "{} {} {}",
                    rule.protocol.token(),
                    rule.listen_port,
                    SocketAddr::new(rule.target_address, rule.target_port)
                );
            }
            return;
        }
        if rules.is_empty() {
            Self::empty("the profile has no rules");
        }
        for (idx, rule) in rules.iter().enumerate() {
            let listen = SocketAddr::from(([0, 0, 0, 0], rule.listen_port));
            let target = SocketAddr::new(rule.target_address, rule.target_port);
            let note = match &rule.description {
                Some(desc) => format!("{} · {desc}", rule.protocol),
                None => rule.protocol.to_string(),
            };
            rule_line(idx, &listen, &target, &note);
        }
    }

    pub fn statuses(statuses: &[PortStatus]) {
        let p = Self::get();
        for status in statuses {
            let state = if status.is_available { "free" } else { "busy" };
            if p.q_level >= 2 {
                pprint!("{} {} {}", status.port_number, state, status.process_descriptor);
                continue;
            }

            let state: ColoredString = if status.is_available {
                state.color(colors::FREE).bold()
            } else {
                state.color(colors::BUSY).bold()
            };
            tree_head_port(status.port_number, state);
            if !status.is_available {
                as_tree(vec![
                    ("Service".to_string(), status.service_name.color(colors::SECONDARY)),
                    ("Process".to_string(), status.process_descriptor.color(colors::TEXT_DEFAULT)),
                ]);
            }
        }
    }

    pub fn profiles(profiles: &[RuleProfile], last_active: &str) {
        let p = Self::get();
        if profiles.is_empty() {
            Self::empty("no profiles saved yet");
            return;
        }
        for (idx, profile) in profiles.iter().enumerate() {
            if p.q_level >= 2 {
                pprint!("{}", profile.name);
                continue;
            }
            let marker = if profile.name == last_active { " ★" } else { "" };
            tree_head(idx, &format!("{}{}", profile.name, marker));
            let details: Vec<Detail> = vec![
                (
                    "Rules".to_string(),
                    profile.rules.len().to_string().color(colors::ACCENT),
                ),
                (
                    "Created".to_string(),
                    profile
                        .created_at
                        .format("%Y-%m-%d %H:%M")
                        .to_string()
                        .color(colors::TEXT_DEFAULT),
                ),
                (
                    "Modified".to_string(),
                    profile
                        .modified_at
                        .format("%Y-%m-%d %H:%M")
                        .to_string()
                        .color(colors::TEXT_DEFAULT),
                ),
            ];
            as_tree(details);
        }
    }

    pub fn backups(names: &[String]) {
        let p = Self::get();
        if names.is_empty() {
            Self::empty("no backups written yet");
            return;
        }
        for (idx, name) in names.iter().enumerate() {
            if p.q_level >= 2 {
                pprint!("{name}");
            } else {
                tree_head(idx, name);
            }
        }
    }

    fn empty(msg: &str) {
        let p = Self::get();
        if p.q_level == 0 && !p.no_banner {
            pprint!("{}", banner::EMPTY_TABLE.bright_black());
            pprint!();
        }
        if p.q_level < 2 {
            print_status(msg);
        }
    }

    pub fn end_of_program() {
        let p = Self::get();
        if p.q_level > 0 {
            return;
        }
        pprint!("{}", "═".repeat(TOTAL_WIDTH).color(colors::SEPARATOR));
    }
}

fn address(addr: &SocketAddr) -> ColoredString {
    let ip = match addr {
        SocketAddr::V4(v4) => v4.ip().to_string().color(colors::IPV4_ADDR),
        SocketAddr::V6(v6) => v6.ip().to_string().color(colors::IPV6_ADDR),
    };
    let port = addr.port().to_string().color(colors::PORT);
    format!("{ip}{}{port}", ":".color(colors::SEPARATOR)).normal()
}

fn rule_line(idx: usize, listen: &SocketAddr, target: &SocketAddr, note: &str) {
    let left: String = format!("[{}] {} → {}", idx, listen, target);
    let padding: String = " ".repeat(TOTAL_WIDTH.saturating_sub(left.width() + note.width()).max(1));

    pprint!(
        "{} {} {} {}{}{}",
        format!("[{}]", idx.to_string().color(colors::ACCENT)).color(colors::SEPARATOR),
        address(listen),
        "→".color(colors::SEPARATOR),
        address(target),
        padding,
        note.color(colors::SECONDARY)
    );
}

fn tree_head_port(port: u16, state: ColoredString) {
    let label: String = format!("port {port}");
    let padding: String = ".".repeat(TOTAL_WIDTH.saturating_sub(label.width() + 8).max(1));
    pprint!(
        "{} {} {}",
        label.color(colors::PRIMARY),
        padding.color(colors::SEPARATOR),
        state
    );
}

pub fn divider() {
    let sep: ColoredString = "═".repeat(TOTAL_WIDTH).bright_black();
    pprint!("{}", sep);
}

pub fn aligned_line<V>(key: &str, value: V)
where
    V: Display + WithDefaultColor,
{
    let whitespace: String = ".".repeat((GLOBAL_KEY_WIDTH.get() + 1).saturating_sub(key.len()));
    let colon: String = format!(
        "{}{}",
        whitespace.color(colors::SEPARATOR),
        ":".color(colors::SEPARATOR)
    );
    let value: ColoredString = value.with_default(colors::TEXT_DEFAULT);
    print_status(format!("{}{} {}", key.color(colors::PRIMARY), colon, value));
}

pub fn print_status<T: AsRef<str>>(msg: T) {
    pprint!(
        "{} {}",
        ">".color(colors::SEPARATOR),
        msg.as_ref().color(colors::TEXT_DEFAULT)
    );
}

pub fn tree_head(idx: usize, name: &str) {
    let idx_str: String = format!("[{}]", idx.to_string().color(colors::ACCENT));
    pprint!(
        "{} {}",
        idx_str.color(colors::SEPARATOR),
        name.color(colors::PRIMARY)
    );
}

pub fn as_tree(details: Vec<Detail>) {
    let padding_width: usize = "Modified".len();

    for (i, (key, value)) in details.iter().enumerate() {
        let last: bool = i + 1 == details.len();
        let branch: ColoredString = if !last { "├─" } else { "└─" }.bright_black();

        let dots_count: usize = padding_width.saturating_sub(key.len());
        let dots: ColoredString = ".".repeat(dots_count).color(colors::SEPARATOR);

        pprint!(
            " {} {}{}{} {}",
            branch,
            key.color(colors::TEXT_DEFAULT),
            dots,
            ":".color(colors::SEPARATOR),
            value
        );
    }
}

pub fn centerln(msg: &str) {
    let space = " ".repeat(TOTAL_WIDTH.saturating_sub(console::measure_text_width(msg)) / 2);
    pprint!("{}{}{}", space, msg, space);
}
