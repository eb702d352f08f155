/// A top-level archival unit, identified by an opaque external id
///
/// Input lists may carry either the bare local id (`W22084`) or a
/// namespace-qualified one (`bdr:W22084`); both resolve to the same work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkId {
    /// Local id, e.g. `W22084`
    pub local: String,
    /// Namespace-qualified id used for metadata queries, e.g. `bdr:W22084`
    pub qualified: String,
}

impl WorkId {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.rsplit_once(':') {
            Some((_, local)) => Self {
                local: local.to_string(),
                qualified: raw.to_string(),
            },
            None => Self {
                local: raw.to_string(),
                qualified: format!("bdr:{}", raw),
            },
        }
    }
}

impl std::fmt::Display for WorkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_id() {
        let work = WorkId::parse("W22084");
        assert_eq!(work.local, "W22084");
        assert_eq!(work.qualified, "bdr:W22084");
    }

    #[test]
    fn test_parse_qualified_id() {
        let work = WorkId::parse("bdr:W22084");
        assert_eq!(work.local, "W22084");
        assert_eq!(work.qualified, "bdr:W22084");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let work = WorkId::parse("  W22084\n");
        assert_eq!(work.local, "W22084");
    }
}
