//! Security selection for a batch run.

use bounds_core::{Error, SecurityId};
use std::fmt;
use std::str::FromStr;

/// Which securities a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecuritySelector {
    /// Every security present in the input.
    All,
    /// One security, matched exactly on its canonical code.
    Single(SecurityId),
}

impl SecuritySelector {
    /// Literal selecting every security.
    pub const ALL: &'static str = "ALL";
}

impl FromStr for SecuritySelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(Self::ALL) {
            Ok(SecuritySelector::All)
        } else {
            SecurityId::canonicalize(s).map(SecuritySelector::Single)
        }
    }
}

impl fmt::Display for SecuritySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecuritySelector::All => f.write_str(Self::ALL),
            SecuritySelector::Single(id) => write!(f, "{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("ALL".parse::<SecuritySelector>().unwrap(), SecuritySelector::All);
        assert_eq!("all".parse::<SecuritySelector>().unwrap(), SecuritySelector::All);

        let single = "1".parse::<SecuritySelector>().unwrap();
        assert_eq!(single.to_string(), "000001");
        assert!(matches!(single, SecuritySelector::Single(_)));

        assert!(matches!(
            "ALLX".parse::<SecuritySelector>(),
            Err(Error::InvalidSecurityCode(_))
        ));
    }
}
