use crate::escape::{escape_path, escape_version};
use crate::record::{parse_record, parse_tree_note, TreeHead};
use crate::{LogOps, SumdbError};
use tracing::debug;

/// Suffix that selects the `go.mod` hash of a module version.
pub const GO_MOD_SUFFIX: &str = "/go.mod";

/// Checksum database client.
///
/// The client follows the lookup protocol but does not verify signatures or
/// inclusion proofs. It only tracks the newest tree head seen during its own
/// lifetime and reports a security error if the server presents two different
/// trees of the same size.
pub struct Client<O: LogOps> {
    ops: O,
    name: String,
    latest: Option<(TreeHead, Vec<u8>)>,
}

impl<O: LogOps> Client<O> {
    /// Create a client, reading the trust anchor and last known tree from `ops`.
    pub fn new(ops: O) -> Result<Self, SumdbError> {
        let key = ops.read_config("key")?;
        let key = String::from_utf8(key)
            .map_err(|_| SumdbError::Config("trust anchor is not valid UTF-8".to_owned()))?;
        let name = server_name(key.trim()).to_owned();
        if name.is_empty() {
            return Err(SumdbError::Config(format!("invalid trust anchor {key:?}")));
        }

        let stored = ops.read_config(&format!("{name}/latest"))?;
        let latest = if stored.is_empty() {
            None
        } else {
            Some((parse_tree_note(&stored)?, stored))
        };

        Ok(Self { ops, name, latest })
    }

    /// Name of the checksum database, taken from the trust anchor.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The newest tree head seen so far.
    pub fn latest(&self) -> Option<&TreeHead> {
        self.latest.as_ref().map(|(tree, _)| tree)
    }

    pub fn ops(&self) -> &O {
        &self.ops
    }

    /// Look up the checksum lines for `path` at `version`.
    ///
    /// `version` may carry the `/go.mod` suffix to select the hash of the
    /// module's `go.mod` file. The returned lines are the record lines that
    /// start with `"<path> <version> "`.
    pub fn lookup(&mut self, path: &str, version: &str) -> Result<Vec<String>, SumdbError> {
        let epath = escape_path(path)?;
        let evers = escape_version(version.strip_suffix(GO_MOD_SUFFIX).unwrap_or(version))?;
        let remote_path = format!("/lookup/{epath}@{evers}");
        let file = format!("{}{remote_path}", self.name);

        let (data, fresh) = match self.ops.read_cache(&file) {
            Ok(data) => (data, false),
            Err(_) => (self.ops.read_remote(&remote_path)?, true),
        };

        let record = parse_record(&data)?;
        let tree = parse_tree_note(record.note)?;
        debug!(
            "lookup {path}@{version}: record {} in tree of size {}",
            record.id, tree.size
        );
        self.merge_latest(tree, record.note)?;

        let prefix = format!("{path} {version} ");
        let lines = record
            .text
            .lines()
            .filter(|line| line.starts_with(&prefix))
            .map(str::to_owned)
            .collect();

        if fresh {
            self.ops.write_cache(&file, &data);
        }
        Ok(lines)
    }

    fn merge_latest(&mut self, tree: TreeHead, note: &[u8]) -> Result<(), SumdbError> {
        match &self.latest {
            Some((latest, _)) if tree.size < latest.size => return Ok(()),
            Some((latest, _)) if tree.size == latest.size => {
                if tree.hash == latest.hash {
                    return Ok(());
                }
                let msg = format!(
                    "checksum database {} presented two different trees of size {}",
                    self.name, tree.size
                );
                self.ops.security_error(&msg);
                return Err(SumdbError::Security(msg));
            }
            _ => {}
        }

        let old = self
            .latest
            .as_ref()
            .map(|(_, note)| note.clone())
            .unwrap_or_default();
        self.ops
            .write_config(&format!("{}/latest", self.name), &old, note)?;
        self.ops.log(&format!(
            "checksum database {} tree advanced to size {}",
            self.name, tree.size
        ));
        self.latest = Some((tree, note.to_vec()));
        Ok(())
    }
}

/// The server name in a trust anchor: everything before the first `+`.
pub fn server_name(key: &str) -> &str {
    key.split_once('+').map_or(key, |(name, _)| name)
}
