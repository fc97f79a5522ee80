use std::sync::OnceLock;

use regex::Regex;

/*
https://modrinth.com/modpack/cobblemon-fabric
https://modrinth.com/modpack/cobblemon-fabric/version/1.5.2
https://www.modrinth.com/project/5FFgwNNP/version/abcd1234?tab=files
 */
const PROJECT_URL: &str = r"^https?://(?:www\.)?modrinth\.com/(?:modpack|mod|project|plugin|datapack|resourcepack|shader)/([^/?#]+)(?:/version/([^/?#]+))?/?(?:[?#].*)?$";
pub fn project_url_regex() -> &'static Regex {
    static PROJECT_URL_REGEX: OnceLock<Regex> = OnceLock::new();
    PROJECT_URL_REGEX.get_or_init(|| Regex::new(PROJECT_URL).expect("regex err"))
}
