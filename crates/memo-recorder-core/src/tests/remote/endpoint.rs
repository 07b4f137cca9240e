use crate::{CoreError, StoreEndpoint, remote::endpoint::DELETE_ROUTE};

/// WHAT: Non-URL and non-http base URLs are rejected
/// WHY: A bad base URL should fail at startup, not on first upload
#[test]
fn given_invalid_base_url_when_building_endpoint_then_invalid_endpoint_error() {
    // Given/When: Building endpoints from unusable URLs
    let not_a_url = StoreEndpoint::new("localhost 5000", None);
    let wrong_scheme = StoreEndpoint::new("ftp://localhost:5000", None);
    let no_base = StoreEndpoint::new("mailto:someone@example.com", None);

    // Then: Each is an InvalidEndpoint error
    assert!(matches!(not_a_url, Err(CoreError::InvalidEndpoint { .. })));
    assert!(matches!(wrong_scheme, Err(CoreError::InvalidEndpoint { .. })));
    assert!(matches!(no_base, Err(CoreError::InvalidEndpoint { .. })));
}

/// WHAT: Playback URLs are the base URL joined with the record path
/// WHY: The presentation layer streams audio from GET /{path}
#[test]
#[allow(clippy::unwrap_used)]
fn given_record_path_when_resolving_media_url_then_joined_to_base() {
    // Given: An endpoint at the default store address
    let endpoint = StoreEndpoint::new("http://localhost:5000", None).unwrap();

    // When: Resolving plain and nested paths
    let plain = endpoint.media_url("r1.webm");
    let nested = endpoint.media_url("uploads/recording0.webm");

    // Then: Paths hang off the base
    assert_eq!(plain.as_str(), "http://localhost:5000/r1.webm");
    assert_eq!(nested.as_str(), "http://localhost:5000/uploads/recording0.webm");
}

/// WHAT: A base URL with a path prefix keeps it
/// WHY: Stores mounted behind a reverse proxy live under a prefix
#[test]
#[allow(clippy::unwrap_used)]
fn given_prefixed_base_url_when_building_routes_then_prefix_kept() {
    // Given: A store mounted under /memo/
    let endpoint = StoreEndpoint::new("https://example.com/memo/", None).unwrap();

    // When: Resolving an api route and a media path
    let list = endpoint.route(&["api", "recordings"]);
    let media = endpoint.media_url("/r1.webm");

    // Then: Both sit under the prefix
    assert_eq!(list.as_str(), "https://example.com/memo/api/recordings");
    assert_eq!(media.as_str(), "https://example.com/memo/r1.webm");
}

/// WHAT: Record ids are encoded as a single path segment
/// WHY: An opaque id must never change which route is hit
#[test]
#[allow(clippy::unwrap_used)]
fn given_id_with_reserved_characters_when_building_delete_route_then_escaped() {
    // Given: An endpoint and an id containing a slash and a space
    let endpoint = StoreEndpoint::new("http://localhost:5000", None).unwrap();

    // When: Building the delete route
    let url = endpoint.route_with(DELETE_ROUTE, "a/b c");

    // Then: The id stays one escaped segment
    assert_eq!(url.as_str(), "http://localhost:5000/api/delete/a%2Fb%20c");
}
