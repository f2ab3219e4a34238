//! Device-specific actions bracketing a data wipe.

use crate::config::HookConfig;
use roots_hal::ProcessOps;

pub trait DeviceHooks {
    fn pre_wipe_data(&self) -> bool;
    fn post_wipe_data(&self) -> bool;
}

/// Devices without hooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl DeviceHooks for NoHooks {
    fn pre_wipe_data(&self) -> bool {
        true
    }

    fn post_wipe_data(&self) -> bool {
        true
    }
}

/// Hooks configured as external commands. An unset hook succeeds.
pub struct CommandHooks<'a> {
    process: &'a dyn ProcessOps,
    pre_wipe_data: Option<Vec<String>>,
    post_wipe_data: Option<Vec<String>>,
}

impl<'a> CommandHooks<'a> {
    pub fn new(process: &'a dyn ProcessOps, config: &HookConfig) -> Self {
        Self {
            process,
            pre_wipe_data: config.pre_wipe_data.clone(),
            post_wipe_data: config.post_wipe_data.clone(),
        }
    }

    fn run(&self, name: &str, argv: Option<&[String]>) -> bool {
        let Some((program, args)) = argv.and_then(|a| a.split_first()) else {
            return true;
        };
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match self.process.command_status(program, &args) {
            Ok(()) => true,
            Err(e) => {
                log::error!("{} hook {} failed: {}", name, program, e);
                false
            }
        }
    }
}

impl DeviceHooks for CommandHooks<'_> {
    fn pre_wipe_data(&self) -> bool {
        self.run("pre-wipe", self.pre_wipe_data.as_deref())
    }

    fn post_wipe_data(&self) -> bool {
        self.run("post-wipe", self.post_wipe_data.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roots_hal::{FakeHal, Operation};

    #[test]
    fn unset_hooks_succeed_without_processes() {
        let hal = FakeHal::new();
        let hooks = CommandHooks::new(&hal, &HookConfig::default());
        assert!(hooks.pre_wipe_data());
        assert!(hooks.post_wipe_data());
        assert_eq!(hal.operation_count(), 0);
    }

    #[test]
    fn hook_exit_status_decides_result() {
        let hal = FakeHal::new();
        hal.set_exit_code("/vendor/bin/postwipe", 1);
        let config = HookConfig {
            pre_wipe_data: Some(vec!["/vendor/bin/prewipe".into(), "--fast".into()]),
            post_wipe_data: Some(vec!["/vendor/bin/postwipe".into()]),
        };
        let hooks = CommandHooks::new(&hal, &config);

        assert!(hooks.pre_wipe_data());
        assert!(!hooks.post_wipe_data());
        assert!(hal.has_operation(|op| matches!(
            op,
            Operation::Command { program, args }
                if program == "/vendor/bin/prewipe" && args == &["--fast".to_string()]
        )));
    }
}
