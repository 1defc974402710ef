// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

mod reconcile;

/// A scripted `netsh` and a fully wired [`Reconciler`] around it.
///
/// [`Reconciler`]: pfwd_core::driver::Reconciler
pub mod utils {
    use std::collections::HashMap;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::{Arc, Mutex, MutexGuard};

    use async_trait::async_trait;
    use tempfile::TempDir;

    use pfwd_common::config::ListenBinding;
    use pfwd_common::error::{ForwardError, Result};
    use pfwd_common::logging::MemoryLog;
    use pfwd_common::models::rule::Protocol;
    use pfwd_core::backup::BackupManager;
    use pfwd_core::command::{CommandOutput, CommandRunner};
    use pfwd_core::driver::Reconciler;
    use pfwd_core::firewall::NetshFirewall;
    use pfwd_core::gateway::NetshGateway;
    use pfwd_core::gateway::parser::render_table;
    use pfwd_core::probe::{OccupancyProber, ProcessResolver, SocketEntry, SocketTable};
    use pfwd_core::settings::SettingsRepository;

    pub const ELEVATION_DENIED: &str =
        "The requested operation requires elevation (Run as administrator).";
    pub const NO_SUCH_ENTRY: &str = "The system cannot find the file specified.";

    /// `(listen address, listen port, target address, target port)`
    pub type Row = (IpAddr, u16, IpAddr, u16);

    #[derive(Default)]
    struct TableState {
        sections: HashMap<Protocol, Vec<Row>>,
        calls: Vec<Vec<String>>,
        firewall_rules: Vec<String>,
        adds: usize,
        fail_adds_after: Option<usize>,
        deny: bool,
        noise: Option<String>,
    }

    /// Keeps a port-proxy table in memory and answers the way `netsh` does:
    /// failures are reported on stdout with exit code 1.
    #[derive(Default)]
    pub struct FakeNetsh {
        state: Mutex<TableState>,
    }

    impl FakeNetsh {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every `add` after the first `n` fails.
        pub fn failing_adds_after(self, n: usize) -> Self {
            self.lock().fail_adds_after = Some(n);
            self
        }

        /// Mutating subcommands fail with the elevation message.
        pub fn denying(self) -> Self {
            self.lock().deny = true;
            self
        }

        /// Appends a line to every `show all` output.
        pub fn with_noise(self, line: &str) -> Self {
            self.lock().noise = Some(line.to_string());
            self
        }

        pub fn seed(self, protocol: Protocol, row: Row) -> Self {
            self.lock().sections.entry(protocol).or_default().push(row);
            self
        }

        fn lock(&self) -> MutexGuard<'_, TableState> {
            self.state.lock().unwrap()
        }

        pub fn calls(&self) -> Vec<Vec<String>> {
            self.lock().calls.clone()
        }

        /// Calls whose third argument is `sub`, e.g. `"add"` or `"reset"`.
        pub fn count(&self, sub: &str) -> usize {
            self.lock()
                .calls
                .iter()
                .filter(|c| c.get(2).is_some_and(|s| s == sub) && c[0] == "interface")
                .count()
        }

        pub fn rows(&self, protocol: Protocol) -> Vec<Row> {
            self.lock().sections.get(&protocol).cloned().unwrap_or_default()
        }

        /// Listen ports across every family, in table order.
        pub fn ports(&self) -> Vec<u16> {
            let state = self.lock();
            Protocol::ALL
                .iter()
                .flat_map(|p| state.sections.get(p).into_iter().flatten())
                .map(|row| row.1)
                .collect()
        }

        pub fn firewall_rules(&self) -> Vec<String> {
            self.lock().firewall_rules.clone()
        }
    }

    fn ok(stdout: impl Into<String>) -> CommandOutput {
        CommandOutput {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    fn failure(message: &str) -> CommandOutput {
        CommandOutput {
            success: false,
            code: Some(1),
            stdout: format!("{message}\n\n"),
            stderr: String::new(),
        }
    }

    fn options<'a>(words: &[&'a str]) -> HashMap<&'a str, &'a str> {
        words.iter().filter_map(|w| w.split_once('=')).collect()
    }

    fn address(value: Option<&&str>) -> Option<IpAddr> {
        match value {
            None | Some(&"*") => Some(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            Some(text) => text.parse().ok(),
        }
    }

    fn parse_row(opts: &HashMap<&str, &str>) -> Option<Row> {
        let listen_port: u16 = opts.get("listenport")?.parse().ok()?;
        let target_port: u16 = match opts.get("connectport") {
            Some(p) => p.parse().ok()?,
            None => listen_port,
        };
        let listen = address(opts.get("listenaddress"))?;
        let target: IpAddr = opts.get("connectaddress")?.parse().ok()?;
        Some((listen, listen_port, target, target_port))
    }

    impl TableState {
        fn show(&self) -> String {
            let sections: Vec<(Protocol, Vec<Row>)> = Protocol::ALL
                .iter()
                .map(|p| (*p, self.sections.get(p).cloned().unwrap_or_default()))
                .collect();
            let mut out = render_table(&sections);
            if let Some(noise) = &self.noise {
                out.push_str(noise);
                out.push('\n');
            }
            out
        }

        fn add(&mut self, token: &str, words: &[&str]) -> CommandOutput {
            let Ok(protocol) = token.parse::<Protocol>() else {
                return failure("The parameter is incorrect.");
            };
            let n = self.adds;
            self.adds += 1;
            if self.fail_adds_after.is_some_and(|limit| n >= limit) {
                return failure("An internal error occurred.");
            }

            let Some(row) = parse_row(&options(words)) else {
                return failure("The parameter is incorrect.");
            };

            let rows = self.sections.entry(protocol).or_default();
            rows.retain(|r| (r.0, r.1) != (row.0, row.1));
            rows.push(row);
            ok("")
        }

        fn delete(&mut self, token: &str, words: &[&str]) -> CommandOutput {
            let Ok(protocol) = token.parse::<Protocol>() else {
                return failure("The parameter is incorrect.");
            };
            let opts = options(words);
            let port = opts.get("listenport").and_then(|p| p.parse::<u16>().ok());
            let listen = address(opts.get("listenaddress"));

            let rows = self.sections.entry(protocol).or_default();
            let before = rows.len();
            rows.retain(|r| Some(r.1) != port || Some(r.0) != listen);
            if rows.len() == before {
                return failure(NO_SUCH_ENTRY);
            }
            ok("")
        }
    }

    #[async_trait]
    impl CommandRunner for FakeNetsh {
        async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
            if program != "netsh" {
                return Err(ForwardError::CommandExecution {
                    command: program.to_string(),
                    message: "program not found".into(),
                });
            }

            let mut state = self.lock();
            state.calls.push(args.to_vec());
            let words: Vec<&str> = args.iter().map(String::as_str).collect();

            let mutating = !matches!(words.as_slice(), ["interface", "portproxy", "show", ..]);
            if mutating && state.deny {
                return Ok(failure(ELEVATION_DENIED));
            }

            let output = match words.as_slice() {
                ["interface", "portproxy", "show", "all"] => ok(state.show()),
                ["interface", "portproxy", "reset"] => {
                    state.sections.clear();
                    ok("")
                }
                ["interface", "portproxy", "add", token, rest @ ..] => state.add(token, rest),
                ["interface", "portproxy", "delete", token, rest @ ..] => state.delete(token, rest),
                ["advfirewall", "firewall", "add", "rule", rest @ ..] => {
                    let name = options(rest).get("name").map(|n| n.to_string());
                    state.firewall_rules.extend(name);
                    ok("Ok.\n")
                }
                _ => failure("The following command was not found."),
            };
            Ok(output)
        }
    }

    /// A socket table frozen at construction.
    pub struct Listeners(pub Vec<(u16, u32, &'static str)>);

    #[async_trait]
    impl SocketTable for Listeners {
        async fn entries(&self) -> Result<Vec<SocketEntry>> {
            Ok(
                self.0
                    .iter()
                    .map(|(port, pid, _)| SocketEntry {
                        local_port: *port,
                        pid: Some(*pid),
                    })
                    .collect(),
            )
        }
    }

    impl ProcessResolver for Listeners {
        fn process_name(&self, pid: u32) -> Option<String> {
            self.0
                .iter()
                .find(|(_, p, _)| *p == pid)
                .map(|(_, _, name)| name.to_string())
        }
    }

    /// What the simulated machine looks like.
    pub struct Host {
        pub binding: ListenBinding,
        pub elevated: fn() -> bool,
        pub listeners: Vec<(u16, u32, &'static str)>,
    }

    impl Default for Host {
        fn default() -> Self {
            Self {
                binding: ListenBinding::default(),
                elevated: || true,
                listeners: Vec::new(),
            }
        }
    }

    pub struct Harness {
        pub driver: Reconciler,
        pub netsh: Arc<FakeNetsh>,
        pub log: Arc<MemoryLog>,
        pub dir: TempDir,
    }

    impl Harness {
        pub fn new() -> Self {
            Self::with(FakeNetsh::new(), Host::default())
        }

        pub fn with(netsh: FakeNetsh, host: Host) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let log = Arc::new(MemoryLog::new());
            let netsh = Arc::new(netsh);

            let gateway = NetshGateway::new(netsh.clone(), host.binding, log.clone())
                .with_elevation(host.elevated);
            let listeners = || Box::new(Listeners(host.listeners.clone()));

            let driver = Reconciler::new(
                Arc::new(gateway),
                Arc::new(NetshFirewall::new(netsh.clone())),
                OccupancyProber::new(listeners(), listeners()),
                SettingsRepository::new(dir.path().join("portforward_settings.json"), log.clone()),
                BackupManager::new(dir.path().join("Backups"), log.clone()),
                log.clone(),
            );

            Self {
                driver,
                netsh,
                log,
                dir,
            }
        }

        /// A second driver over the same files, as if the program restarted.
        pub fn restart(&self) -> Reconciler {
            self.restart_as(|| true)
        }

        /// Like [`Harness::restart`], from a shell with the given elevation.
        pub fn restart_as(&self, elevated: fn() -> bool) -> Reconciler {
            Reconciler::new(
                Arc::new(
                    NetshGateway::new(self.netsh.clone(), ListenBinding::default(), self.log.clone())
                        .with_elevation(elevated),
                ),
                Arc::new(NetshFirewall::new(self.netsh.clone())),
                OccupancyProber::new(Box::new(Listeners(Vec::new())), Box::new(Listeners(Vec::new()))),
                SettingsRepository::new(
                    self.dir.path().join("portforward_settings.json"),
                    self.log.clone(),
                ),
                BackupManager::new(self.dir.path().join("Backups"), self.log.clone()),
                self.log.clone(),
            )
        }
    }

    impl Default for Harness {
        fn default() -> Self {
            Self::new()
        }
    }
}
