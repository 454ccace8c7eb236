use std::fmt;
use std::str::FromStr;

use crate::error::KvError;

/// Quorum parameters of a single request: `ack` confirmations out of `from`
/// contacted replicas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicaFactor {
    pub ack: usize,
    pub from: usize,
}

impl ReplicaFactor {
    pub fn new(ack: usize, from: usize, cluster_size: usize) -> Result<Self, KvError> {
        let rf = Self { ack, from };
        rf.validate(cluster_size)?;
        Ok(rf)
    }

    /// Majority of the full cluster.
    pub fn quorum(cluster_size: usize) -> Self {
        Self {
            ack: cluster_size / 2 + 1,
            from: cluster_size,
        }
    }

    /// Parse an optional `ack/from` parameter, defaulting to [`quorum`](Self::quorum).
    pub fn parse_or_default(param: Option<&str>, cluster_size: usize) -> Result<Self, KvError> {
        match param {
            None | Some("") => Ok(Self::quorum(cluster_size)),
            Some(raw) => {
                let rf: ReplicaFactor = raw.parse()?;
                rf.validate(cluster_size)?;
                Ok(rf)
            }
        }
    }

    pub fn validate(&self, cluster_size: usize) -> Result<(), KvError> {
        if self.ack == 0 || self.ack > self.from || self.from > cluster_size {
            return Err(KvError::InvalidRequest(format!(
                "replicas {} out of range for {} nodes",
                self, cluster_size
            )));
        }
        Ok(())
    }
}

impl FromStr for ReplicaFactor {
    type Err = KvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || KvError::InvalidRequest(format!("malformed replicas parameter: {:?}", s));
        let (ack, from) = s.split_once('/').ok_or_else(bad)?;
        Ok(Self {
            ack: ack.trim().parse().map_err(|_| bad())?,
            from: from.trim().parse().map_err(|_| bad())?,
        })
    }
}

impl fmt::Display for ReplicaFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ack, self.from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_cluster_majority() {
        assert_eq!(ReplicaFactor::quorum(3), ReplicaFactor { ack: 2, from: 3 });
        assert_eq!(ReplicaFactor::quorum(4), ReplicaFactor { ack: 3, from: 4 });
        assert_eq!(ReplicaFactor::quorum(1), ReplicaFactor { ack: 1, from: 1 });
        assert_eq!(
            ReplicaFactor::parse_or_default(None, 5).unwrap(),
            ReplicaFactor { ack: 3, from: 5 }
        );
    }

    #[test]
    fn parses_ack_from() {
        assert_eq!(
            ReplicaFactor::parse_or_default(Some("2/3"), 3).unwrap(),
            ReplicaFactor { ack: 2, from: 3 }
        );
        assert_eq!("1/1".parse::<ReplicaFactor>().unwrap().to_string(), "1/1");
    }

    #[test]
    fn rejects_malformed_and_out_of_range() {
        for raw in ["2", "a/3", "2/", "/3", "2/3/4", "-1/3"] {
            assert!(
                ReplicaFactor::parse_or_default(Some(raw), 3).is_err(),
                "{raw} should be rejected"
            );
        }
        for raw in ["0/3", "3/2", "2/4", "0/0"] {
            assert!(matches!(
                ReplicaFactor::parse_or_default(Some(raw), 3),
                Err(KvError::InvalidRequest(_))
            ));
        }
    }
}
