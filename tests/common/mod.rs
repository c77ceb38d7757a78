//! Shared fixtures for the HTTP-backed tests.

use movielist::config::CatalogProfile;
use std::time::Duration;
use wiremock::MockServer;

pub const API_KEY: &str = "test-key";

/// Profile pointed at a mock catalog, caching under `cache_dir`
pub fn profile_for(server: &MockServer, cache_dir: &tempfile::TempDir) -> CatalogProfile {
    let mut profile = CatalogProfile::blank("test");
    profile.set_api_base(format!("{}/3", server.uri()));
    profile.set_image_base(format!("{}/t/p/w500", server.uri()));
    profile.set_api_key(API_KEY);
    profile.set_timeout(Duration::from_secs(2));
    profile.set_cache_path(cache_dir.path().join("catalog.json"));
    profile
}

/// An upcoming-movies body in the catalog's wire format
pub fn upcoming_body() -> serde_json::Value {
    serde_json::json!({
        "dates": {"maximum": "2024-04-10", "minimum": "2024-03-20"},
        "page": 1,
        "results": [
            {
                "id": 693134,
                "title": "Dune: Part Two",
                "overview": "Follow the mythic journey of Paul Atreides.",
                "release_date": "2024-02-27",
                "vote_average": 8.3,
                "poster_path": "/czembW0Rk1Ke7lCJGahbOhdCuhV.jpg"
            },
            {
                "id": 823464,
                "title": "Godzilla x Kong: The New Empire",
                "overview": "Two ancient titans clash.",
                "release_date": "2024-03-27",
                "vote_average": 7.2,
                "poster_path": "/tMefBSflR6PGQLv7WvFPpKLZkyk.jpg"
            },
            {
                "id": 438631,
                "title": "Dune",
                "overview": "Paul Atreides arrives on Arrakis.",
                "release_date": "2021-09-15",
                "vote_average": 7.8,
                "poster_path": null
            }
        ],
        "total_pages": 1,
        "total_results": 3
    })
}
