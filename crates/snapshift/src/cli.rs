use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use snapshift_core::ObjectRef;
use snapshift_operations::operations::MigrationRequest;

use crate::connect::ConnectionOptions;

#[derive(Debug, Parser)]
#[command(name = "snapshift")]
#[command(version = env!("SNAPSHIFT_VERSION"))]
#[command(about = "Snapshot and migrate PVCs across Kubernetes clusters")]
#[command(
    long_about = "Creates a snapshot of a PVC in an origin cluster, replicates the snapshot to a \
destination cluster that uses the same underlying storage, and optionally creates a PVC from the \
snapshot in the destination cluster."
)]
pub(crate) struct Cli {
    /// Path to origin cluster kubeconfig (defaults to KUBECONFIG or ~/.kube/config)
    #[arg(long, env = "SNAPSHIFT_ORIGIN_KUBECONFIG", value_name = "PATH")]
    pub origin_kubeconfig: Option<PathBuf>,

    /// Path to destination cluster kubeconfig (defaults to the origin kubeconfig)
    #[arg(long, env = "SNAPSHIFT_DEST_KUBECONFIG", value_name = "PATH")]
    pub dest_kubeconfig: Option<PathBuf>,

    /// Origin cluster context name
    #[arg(long, env = "SNAPSHIFT_ORIGIN_CONTEXT", value_name = "NAME")]
    pub origin_context: Option<String>,

    /// Destination cluster context name
    #[arg(long, env = "SNAPSHIFT_DEST_CONTEXT", value_name = "NAME")]
    pub dest_context: Option<String>,

    /// Name of the PVC to snapshot
    #[arg(long, short = 'p', value_name = "NAME")]
    pub pvc: String,

    /// Namespace of the source PVC
    #[arg(long, short = 'n', default_value = "default", value_name = "NAMESPACE")]
    pub namespace: String,

    /// Name for the snapshot (defaults to <pvc>-snapshot-<timestamp>)
    #[arg(long, value_name = "NAME")]
    pub snapshot_name: Option<String>,

    /// Name for the destination snapshot (defaults to the snapshot name)
    #[arg(long, value_name = "NAME")]
    pub dest_snapshot_name: Option<String>,

    /// Create a PVC from the snapshot in the destination cluster
    #[arg(long)]
    pub create_pvc: bool,

    /// Name for the destination PVC
    #[arg(long, value_name = "NAME", required_if_eq("create_pvc", "true"))]
    pub dest_pvc_name: Option<String>,

    /// Destination namespace (defaults to the source namespace)
    #[arg(long, value_name = "NAMESPACE")]
    pub dest_namespace: Option<String>,

    /// VolumeSnapshotClass name (the cluster default is used if omitted)
    #[arg(long, value_name = "CLASS")]
    pub snapshot_class: Option<String>,

    /// Deadline for the whole migration, e.g. 90s, 10m, 1h
    #[arg(
        long,
        env = "SNAPSHIFT_TIMEOUT",
        default_value = "10m",
        value_parser = humantime::parse_duration
    )]
    pub timeout: Duration,

    /// Log debug details, including every readiness poll
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl Cli {
    pub(crate) fn to_request(&self) -> MigrationRequest {
        let mut request = MigrationRequest::new(ObjectRef::new(&self.namespace, &self.pvc))
            .with_timeout(self.timeout);
        request.snapshot_name.clone_from(&self.snapshot_name);
        request.dest_snapshot_name.clone_from(&self.dest_snapshot_name);
        request.dest_namespace.clone_from(&self.dest_namespace);
        request.snapshot_class.clone_from(&self.snapshot_class);
        if self.create_pvc {
            request = request.with_dest_claim(self.dest_pvc_name.clone().unwrap_or_default());
        }
        request
    }

    pub(crate) fn origin_connection(&self) -> ConnectionOptions {
        ConnectionOptions {
            kubeconfig: self.origin_kubeconfig.clone(),
            context: self.origin_context.clone(),
        }
    }

    /// Destination connection; the kubeconfig falls back to the origin's.
    pub(crate) fn destination_connection(&self) -> ConnectionOptions {
        ConnectionOptions {
            kubeconfig: self
                .dest_kubeconfig
                .clone()
                .or_else(|| self.origin_kubeconfig.clone()),
            context: self.dest_context.clone(),
        }
    }

    pub(crate) fn log_filter(&self) -> Option<&'static str> {
        self.verbose.then_some("snapshift=debug")
    }
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("snapshift").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn defaults_apply_to_optional_flags() {
        let cli = parse(&["--pvc", "db"]);

        assert_eq!(cli.namespace, "default");
        assert!(!cli.create_pvc);
        assert!(cli.log_filter().is_none());
        let request = cli.to_request();
        assert_eq!(request.source_claim, ObjectRef::new("default", "db"));
        assert!(request.snapshot_name.is_none());
        assert!(request.dest_claim.is_none());
    }

    #[test]
    fn timeout_accepts_human_durations() {
        let cli = parse(&["-p", "db", "--timeout", "90s"]);

        assert_eq!(cli.timeout, Duration::from_secs(90));
        assert_eq!(cli.to_request().timeout, Duration::from_secs(90));
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let result = Cli::try_parse_from(["snapshift", "-p", "db", "--timeout", "soon"]);

        let err = result.expect_err("timeout should not parse");
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn create_pvc_requires_destination_name() {
        let result = Cli::try_parse_from(["snapshift", "-p", "db", "--create-pvc"]);

        let err = result.expect_err("--dest-pvc-name should be required");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn create_pvc_builds_destination_claim_request() {
        let cli = parse(&[
            "-p",
            "db",
            "-n",
            "ns1",
            "--dest-namespace",
            "ns2",
            "--create-pvc",
            "--dest-pvc-name",
            "db-restored",
        ]);

        let request = cli.to_request();

        assert_eq!(
            request.dest_claim.map(|c| c.name),
            Some("db-restored".to_string())
        );
        assert_eq!(request.dest_namespace.as_deref(), Some("ns2"));
    }

    #[test]
    fn destination_kubeconfig_falls_back_to_origin() {
        let cli = parse(&[
            "-p",
            "db",
            "--origin-kubeconfig",
            "/tmp/origin.yaml",
            "--dest-context",
            "dr",
        ]);

        let destination = cli.destination_connection();

        assert_eq!(destination.kubeconfig, Some(PathBuf::from("/tmp/origin.yaml")));
        assert_eq!(destination.context.as_deref(), Some("dr"));
        assert!(cli.origin_connection().context.is_none());
    }

    #[test]
    fn verbose_switches_to_debug_logging() {
        let cli = parse(&["-p", "db", "-v"]);

        assert_eq!(cli.log_filter(), Some("snapshift=debug"));
    }
}
