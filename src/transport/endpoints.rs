use reqwest::Url;

use crate::OptionField;
use crate::OptionsError;
use crate::Result;

/// Coordinates of one namespace on the config service
#[derive(Debug, Clone, Copy)]
pub struct ConfigEndpoint<'a> {
    pub host: &'a str,
    pub app_id: &'a str,
    pub cluster: &'a str,
    pub namespace: &'a str,
    pub ip: Option<&'a str>,
    pub data_center: Option<&'a str>,
}

/// Uncached config API, honours `releaseKey` for 304 responses:
/// `{host}/configs/{appId}/{cluster}/{namespace}?releaseKey=&ip=&dataCenter=`
pub fn query_config(
    endpoint: &ConfigEndpoint<'_>,
    release_key: Option<&str>,
) -> Result<String> {
    build(
        endpoint.host,
        &["configs", endpoint.app_id, endpoint.cluster, endpoint.namespace],
        &[
            ("releaseKey", release_key),
            ("ip", endpoint.ip),
            ("dataCenter", endpoint.data_center),
        ],
    )
}

/// CDN-cacheable config API returning the flat key/value map:
/// `{host}/configfiles/json/{appId}/{cluster}/{namespace}?ip=&dataCenter=`
pub fn query_config_as_json(endpoint: &ConfigEndpoint<'_>) -> Result<String> {
    build(
        endpoint.host,
        &[
            "configfiles",
            "json",
            endpoint.app_id,
            endpoint.cluster,
            endpoint.namespace,
        ],
        &[("ip", endpoint.ip), ("dataCenter", endpoint.data_center)],
    )
}

/// Long-poll API. `notifications` is the JSON encoded list of
/// `{namespaceName, notificationId}` pairs.
pub fn query_update(
    host: &str,
    app_id: &str,
    cluster: &str,
    notifications: &str,
) -> Result<String> {
    build(
        host,
        &["notifications", "v2"],
        &[
            ("appId", Some(app_id)),
            ("cluster", Some(cluster)),
            ("notifications", Some(notifications)),
        ],
    )
}

fn build(
    host: &str,
    segments: &[&str],
    query: &[(&str, Option<&str>)],
) -> Result<String> {
    let invalid = || OptionsError::new(OptionField::Host, "must be an absolute http(s) URL", host);

    let mut url = Url::parse(host).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .extend(segments);

    let mut pairs = query.iter().filter_map(|(k, v)| v.map(|v| (*k, v))).peekable();
    if pairs.peek().is_some() {
        url.query_pairs_mut().extend_pairs(pairs);
    }

    Ok(url.into())
}
