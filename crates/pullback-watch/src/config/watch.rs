use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use clap::Parser;
use clap::ValueEnum;

use crate::domain::backoff::DetectionOptions;
use crate::domain::selector::DeploymentSelector;
use crate::domain::watcher::RetryPolicy;
use crate::infrastructure::notifier::Notification;

/// Where the recovery notification goes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NotifierKind {
    /// Desktop notification service
    #[default]
    Desktop,
    /// Log line only
    Log,
}

/// Which pods to look at and how to reach the cluster. Shared by `watch` and `check`.
#[derive(Args, Clone, Debug)]
pub struct SelectorArgs {
    #[arg(long, env = "PULLBACK_NAMESPACE", help = "Namespace of the deployment")]
    pub namespace: String,

    #[arg(
        long,
        env = "PULLBACK_DEPLOYMENT",
        help = "Deployment label value, pods are selected with <label-key>=<deployment>"
    )]
    pub deployment: String,

    #[arg(
        long,
        env = "PULLBACK_LABEL_KEY",
        default_value = DeploymentSelector::DEFAULT_LABEL_KEY,
        help = "Pod label carrying the deployment name"
    )]
    pub label_key: String,

    #[arg(
        long,
        env = "PULLBACK_INCLUDE_INIT_CONTAINERS",
        default_value_t = false,
        action = clap::ArgAction::Set,
        help = "Also treat init containers in ImagePullBackOff as backoff"
    )]
    pub include_init_containers: bool,

    #[arg(
        long,
        env = "KUBECONFIG_PATH",
        value_hint = clap::ValueHint::FilePath,
        help = "Path to kubeconfig file (default: local kubeconfig, then in-cluster)"
    )]
    pub kubeconfig: Option<PathBuf>,
}

impl SelectorArgs {
    pub fn selector(&self) -> DeploymentSelector {
        DeploymentSelector::with_label_key(&self.namespace, &self.label_key, &self.deployment)
    }

    pub fn detection(&self) -> DetectionOptions {
        DetectionOptions {
            include_init_containers: self.include_init_containers,
        }
    }
}

#[derive(Parser, Clone, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub target: SelectorArgs,

    #[arg(
        long,
        env = "PULLBACK_POLL_INTERVAL_SECS",
        default_value = "10",
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Seconds to wait between pod queries"
    )]
    pub poll_interval_secs: u64,

    #[arg(
        long,
        env = "PULLBACK_MAX_CONSECUTIVE_FAILURES",
        help = "Stop after this many failed queries in a row (default: retry forever)"
    )]
    pub max_consecutive_failures: Option<u32>,

    #[arg(long, env = "PULLBACK_NOTIFIER", value_enum, default_value_t = NotifierKind::Desktop)]
    pub notifier: NotifierKind,

    #[arg(long, env = "PULLBACK_TITLE", default_value = "Kubernetes Update")]
    pub title: String,

    #[arg(long, env = "PULLBACK_MESSAGE", default_value = "All pods are running normally!")]
    pub message: String,

    #[arg(
        long,
        env = "PULLBACK_ICON",
        default_value = "img.png",
        value_hint = clap::ValueHint::FilePath
    )]
    pub icon: PathBuf,
}

impl WatchArgs {
    pub fn selector(&self) -> DeploymentSelector {
        self.target.selector()
    }

    pub fn detection(&self) -> DetectionOptions {
        self.target.detection()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            interval: Duration::from_secs(self.poll_interval_secs),
            max_consecutive_failures: self.max_consecutive_failures,
        }
    }

    pub fn notification(&self) -> Notification {
        Notification {
            title: self.title.clone(),
            message: self.message.clone(),
            icon: Some(self.icon.clone()),
        }
    }
}

#[derive(Parser, Clone, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub target: SelectorArgs,
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: WatchArgs,
    }

    #[derive(Parser)]
    struct TestCheckCli {
        #[command(flatten)]
        args: CheckArgs,
    }

    fn parse(extra: &[&str]) -> WatchArgs {
        let mut argv = vec!["pullback-watch", "--namespace", "shop", "--deployment", "web"];
        argv.extend_from_slice(extra);
        TestCli::try_parse_from(argv).unwrap().args
    }

    #[test]
    fn defaults() {
        let args = parse(&[]);

        assert_eq!(args.selector().label_selector(), "app=web");
        assert_eq!(args.retry_policy(), RetryPolicy::default());
        assert_eq!(args.detection(), DetectionOptions::default());
        assert_eq!(args.notification(), Notification::default());
        assert_eq!(args.notifier, NotifierKind::Desktop);
        assert!(args.target.kubeconfig.is_none());
    }

    #[test]
    fn overrides() {
        let args = parse(&[
            "--label-key",
            "app.kubernetes.io/name",
            "--poll-interval-secs",
            "3",
            "--max-consecutive-failures",
            "5",
            "--include-init-containers",
            "true",
            "--notifier",
            "log",
            "--icon",
            "/usr/share/icons/ok.png",
        ]);

        assert_eq!(
            args.selector().label_selector(),
            "app.kubernetes.io/name=web"
        );
        assert_eq!(
            args.retry_policy(),
            RetryPolicy {
                interval: Duration::from_secs(3),
                max_consecutive_failures: Some(5),
            }
        );
        assert!(args.detection().include_init_containers);
        assert_eq!(args.notifier, NotifierKind::Log);
        assert_eq!(
            args.notification().icon,
            Some(PathBuf::from("/usr/share/icons/ok.png"))
        );
    }

    #[test]
    fn zero_interval_is_rejected() {
        let result = TestCli::try_parse_from([
            "pullback-watch",
            "--namespace",
            "shop",
            "--deployment",
            "web",
            "--poll-interval-secs",
            "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn check_only_takes_selector_flags() {
        let args = TestCheckCli::try_parse_from([
            "pullback-watch",
            "--namespace",
            "shop",
            "--deployment",
            "web",
            "--include-init-containers",
            "true",
        ])
        .unwrap()
        .args;
        assert_eq!(args.target.selector().label_selector(), "app=web");
        assert!(args.target.detection().include_init_containers);

        for flag in [
            ["--notifier", "log"],
            ["--title", "Done"],
            ["--poll-interval-secs", "3"],
            ["--max-consecutive-failures", "2"],
        ] {
            let mut argv = vec!["pullback-watch", "--namespace", "shop", "--deployment", "web"];
            argv.extend_from_slice(&flag);
            assert!(
                TestCheckCli::try_parse_from(argv).is_err(),
                "check should reject {}",
                flag[0]
            );
        }
    }
}
