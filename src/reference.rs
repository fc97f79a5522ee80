use std::fmt::{self, Display, Formatter};

use packfetch_util::regex::project_url_regex;

use crate::error::FetchError;

/// A project plus a version selector, as typed by a user.
///
/// The selector may be a version id, a version number, `release`/`beta`/`alpha`,
/// `latest`, or empty for the newest version of the default channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRef {
    id_or_slug: String,
    version: String,
}

impl ProjectRef {
    pub fn new<S: Into<String>, V: Into<String>>(id_or_slug: S, version: V) -> Self {
        Self {
            id_or_slug: id_or_slug.into(),
            version: version.into(),
        }
    }

    /// Accepts `slug`, `slug:selector` or a project page URL such as
    /// `https://modrinth.com/modpack/<slug>/version/<selector>`.
    ///
    /// A non-empty `version` wins over one embedded in `project`.
    pub fn parse<S: AsRef<str>>(project: S, version: Option<&str>) -> Result<Self, FetchError> {
        let project = project.as_ref().trim();

        let is_url = project.starts_with("http://") || project.starts_with("https://");
        let (id_or_slug, embedded) = if is_url {
            let caps = project_url_regex().captures(project).ok_or_else(|| {
                FetchError::InvalidReference(format!("unsupported project url {project}"))
            })?;
            let slug = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            (slug, caps.get(2).map(|m| m.as_str()))
        } else if let Some((slug, selector)) = project.split_once(':') {
            (slug, Some(selector))
        } else {
            (project, None)
        };

        if id_or_slug.is_empty() {
            return Err(FetchError::InvalidReference(format!(
                "missing project in {project:?}"
            )));
        }

        let version = version
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .or(embedded)
            .unwrap_or_default();
        Ok(Self::new(id_or_slug, version))
    }

    pub fn id_or_slug(&self) -> &str {
        &self.id_or_slug
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl Display for ProjectRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            f.write_str(&self.id_or_slug)
        } else {
            write!(f, "{}:{}", self.id_or_slug, self.version)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_bare_slug() {
        let reference = ProjectRef::parse("test_project1", Some("abcd1234")).unwrap();
        assert_eq!(reference, ProjectRef::new("test_project1", "abcd1234"));
        assert_eq!(reference.to_string(), "test_project1:abcd1234");

        let reference = ProjectRef::parse(" test_project1 ", None).unwrap();
        assert_eq!(reference.version(), "");
        assert_eq!(reference.to_string(), "test_project1");
    }

    #[test]
    fn parses_shorthand() {
        let reference = ProjectRef::parse("test_project1:release", None).unwrap();
        assert_eq!(reference.id_or_slug(), "test_project1");
        assert_eq!(reference.version(), "release");

        let reference = ProjectRef::parse("test_project1:release", Some("1.0.0")).unwrap();
        assert_eq!(reference.version(), "1.0.0");
    }

    #[test]
    fn parses_project_urls() {
        let reference =
            ProjectRef::parse("https://modrinth.com/modpack/test_project1/version/1.0.0", None)
                .unwrap();
        assert_eq!(reference, ProjectRef::new("test_project1", "1.0.0"));

        let reference =
            ProjectRef::parse("https://modrinth.com/modpack/test_project1", Some("")).unwrap();
        assert_eq!(reference, ProjectRef::new("test_project1", ""));
    }

    #[test]
    fn rejects_unusable_references() {
        assert!(matches!(
            ProjectRef::parse("", None),
            Err(FetchError::InvalidReference(_))
        ));
        assert!(matches!(
            ProjectRef::parse(":release", None),
            Err(FetchError::InvalidReference(_))
        ));
        assert!(matches!(
            ProjectRef::parse("https://example.com/modpack/x", None),
            Err(FetchError::InvalidReference(_))
        ));
    }
}
