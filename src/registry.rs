use crate::command::Command;
use std::collections::{BTreeMap, HashMap};

/// Owns every command the shell knows, keyed by name, plus the alias table.
///
/// The registry is built once at startup, optionally extended with aliases by
/// the startup-script loader, and read-only for the rest of the session.
/// There is a single thread of control, so no synchronization is involved.
pub struct Registry {
    commands: BTreeMap<String, Box<dyn Command>>,
    aliases: HashMap<String, String>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            commands: BTreeMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// Bind `name` to `command`, overwriting any prior binding for that name.
    ///
    /// Always succeeds; a previously registered command under the same name
    /// is dropped.
    pub fn register(&mut self, name: impl Into<String>, command: Box<dyn Command>) {
        self.commands.insert(name.into(), command);
    }

    /// Bind `alias` to a target command name, overwriting unconditionally.
    ///
    /// The target is not validated: a dangling alias is permitted and simply
    /// fails to resolve until (or unless) its target is registered.
    pub fn register_alias(&mut self, alias: impl Into<String>, target: impl Into<String>) {
        self.aliases.insert(alias.into(), target.into());
    }

    /// Look up a name, checking the alias table first.
    ///
    /// An alias is followed exactly one level: its target is looked up in the
    /// command map only, never in the alias map again, and a missing target
    /// means `None` even if a command with the alias's own name exists.
    /// `None` is a normal negative result, not an error.
    pub fn resolve(&self, name: &str) -> Option<&dyn Command> {
        if let Some(target) = self.aliases.get(name) {
            return self.commands.get(target).map(|c| c.as_ref());
        }
        self.commands.get(name).map(|c| c.as_ref())
    }

    /// Enumerate registered command names with their help text, sorted by name.
    pub fn list(&self) -> impl Iterator<Item = (&str, &str)> {
        self.commands.iter().map(|(n, c)| (n.as_str(), c.describe()))
    }

    /// Every name the user can type: command names plus alias names.
    ///
    /// Used by tab completion.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.extend(self.aliases.keys().cloned());
        names
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Registry;
    use crate::command::{Command, Context, ExitCode};
    use anyhow::Result;

    /// Inert command distinguishable by its help text.
    struct Probe(&'static str);

    impl Command for Probe {
        fn run(&self, _args: &[String], _ctx: &mut Context<'_>) -> Result<ExitCode> {
            Ok(0)
        }

        fn describe(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn resolve_finds_registered_command() {
        let mut registry = Registry::new();
        registry.register("probe", Box::new(Probe("first")));

        assert_eq!(registry.resolve("probe").unwrap().describe(), "first");
        assert!(registry.resolve("missing").is_none());
    }

    #[test]
    fn register_overwrites_previous_binding() {
        // A name registered twice keeps only the later binding.
        let mut registry = Registry::new();
        registry.register("ps", Box::new(Probe("first")));
        registry.register("ps", Box::new(Probe("second")));

        assert_eq!(registry.resolve("ps").unwrap().describe(), "second");
    }

    #[test]
    fn alias_resolution_is_late_bound() {
        let mut registry = Registry::new();
        // Alias registered before its target exists: legal, resolves once the
        // target shows up.
        registry.register_alias("g", "grep");
        assert!(registry.resolve("g").is_none());

        registry.register("grep", Box::new(Probe("old grep")));
        assert_eq!(registry.resolve("g").unwrap().describe(), "old grep");

        // Rebinding the target is visible through the alias at next lookup.
        registry.register("grep", Box::new(Probe("new grep")));
        assert_eq!(registry.resolve("g").unwrap().describe(), "new grep");
    }

    #[test]
    fn alias_chains_are_not_followed() {
        let mut registry = Registry::new();
        registry.register_alias("a", "b");
        registry.register_alias("b", "c");
        registry.register("c", Box::new(Probe("target")));

        // a -> b stops at the command map: b is only an alias, so a is dead.
        assert!(registry.resolve("a").is_none());

        // Once b is also a command name, a resolves to that command, still
        // without consulting the alias map a second time.
        registry.register("b", Box::new(Probe("direct b")));
        assert_eq!(registry.resolve("a").unwrap().describe(), "direct b");
        // b itself is an alias first, so it resolves to c's command.
        assert_eq!(registry.resolve("b").unwrap().describe(), "target");
    }

    #[test]
    fn alias_shadows_command_of_same_name() {
        let mut registry = Registry::new();
        registry.register("ll", Box::new(Probe("detail listing")));
        registry.register_alias("ll", "ls -la");

        // The alias table is checked first and "ls -la" is not a registered
        // command name, so the ll command becomes unreachable.
        assert!(registry.resolve("ll").is_none());
    }

    #[test]
    fn list_is_sorted_by_name() {
        let mut registry = Registry::new();
        registry.register("wc", Box::new(Probe("wc help")));
        registry.register("cat", Box::new(Probe("cat help")));
        registry.register("ls", Box::new(Probe("ls help")));
        registry.register_alias("c", "cat");

        let listed: Vec<(&str, &str)> = registry.list().collect();
        // Aliases are not listed; order is deterministic (sorted).
        assert_eq!(
            listed,
            vec![("cat", "cat help"), ("ls", "ls help"), ("wc", "wc help")]
        );
    }

    #[test]
    fn names_cover_commands_and_aliases() {
        let mut registry = Registry::new();
        registry.register("cat", Box::new(Probe("cat help")));
        registry.register_alias("c", "cat");

        let mut names = registry.names();
        names.sort();
        assert_eq!(names, vec!["c".to_string(), "cat".to_string()]);
    }
}
