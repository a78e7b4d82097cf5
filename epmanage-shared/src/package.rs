use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    #[serde(default)]
    pub osversion: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
    pub name: String,
    pub url: String,
}

impl Package {
    pub fn matches(&self, osversion: Option<&str>, arch: Option<&str>) -> bool {
        let version_ok = osversion.is_none_or(|v| self.osversion.as_deref() == Some(v));
        let arch_ok = arch.is_none_or(|a| self.arch.as_deref() == Some(a));
        version_ok && arch_ok
    }
}

/// Packages built for one operating system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageGroup {
    pub os: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub packages: Vec<Package>,
}

impl PackageGroup {
    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        let date = self.date.as_deref()?;
        DateTime::parse_from_rfc3339(date)
            .or_else(|_| DateTime::parse_from_rfc2822(date))
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }
}

/// Body of `GET /frontend/packages`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageListResponse {
    #[serde(default)]
    pub data: Vec<PackageGroup>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(osversion: Option<&str>, arch: Option<&str>) -> Package {
        Package {
            osversion: osversion.map(str::to_string),
            arch: arch.map(str::to_string),
            name: "agent".to_string(),
            url: "https://example.invalid/agent".to_string(),
        }
    }

    #[test]
    fn test_matches_without_constraints() {
        assert!(pkg(None, None).matches(None, None));
        assert!(pkg(Some("10"), Some("x64")).matches(None, None));
    }

    #[test]
    fn test_matches_with_constraints() {
        let p = pkg(Some("10"), Some("x64"));
        assert!(p.matches(Some("10"), Some("x64")));
        assert!(!p.matches(Some("11"), None));
        assert!(!p.matches(None, Some("arm")));
        assert!(!pkg(None, None).matches(None, Some("x64")));
    }

    #[test]
    fn test_generated_at_accepts_http_dates() {
        let group = PackageGroup {
            os: "linux".to_string(),
            date: Some("Tue, 02 Apr 2013 10:29:13 GMT".to_string()),
            packages: vec![],
        };
        assert!(group.generated_at().is_some());

        let group = PackageGroup {
            date: Some("yesterday".to_string()),
            ..group
        };
        assert!(group.generated_at().is_none());
    }

    #[test]
    fn test_list_response_parses() {
        let raw = r#"{"data": [{"os": "linux", "date": "2017-01-01T00:00:00Z",
            "packages": [{"arch": "x64", "name": "epc", "url": "u1"}]}]}"#;
        let list: PackageListResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(list.data.len(), 1);
        assert_eq!(list.data[0].packages[0].arch.as_deref(), Some("x64"));
        assert_eq!(list.data[0].packages[0].osversion, None);
    }
}
