//! Configuration file loading.
//!
//! Instances and their routes come from a TOML file:
//!
//! ```toml
//! listen = "127.0.0.1:3000"
//!
//! [instances.home]
//! poll_interval_secs = 300
//! surface = "api"
//!
//! [instances.home.routes.work]
//! from = "Perth Busport"
//! from_position = "-31.951,115.853"
//! to = "Curtin University"
//! to_position = "-32.005,115.894"
//! transport_options = ["bus", "train"]
//! ```
//!
//! A route may instead (or additionally) carry a `url` copied from the
//! Journey Planner. Its query parameters seed the route; keys written in
//! the table win over the seed.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use indexmap::IndexMap;
use reqwest::Url;
use serde::Deserialize;
use tracing::warn;

use crate::domain::{
    DEFAULT_PLACE_TYPE, DateSpec, DepartureOption, Place, RouteConfig, TimeSpec, TransportModes,
    ValidationError, WalkSpeed,
};
use crate::transperth::{Surface, mode_from_legacy_flag};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "JOURNEY_CONFIG";

/// Config file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "journeys.toml";

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

/// Polling any faster than this is clamped.
pub const MIN_POLL_INTERVAL_SECS: u64 = 60;

/// Errors loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("instance {instance}, route {route:?}: {source}")]
    InvalidRoute {
        instance: String,
        route: String,
        #[source]
        source: ValidationError,
    },

    #[error("instance {instance}, route {route:?}: invalid planner URL: {message}")]
    InvalidUrl {
        instance: String,
        route: String,
        message: String,
    },

    #[error("no instances configured")]
    NoInstances,
}

/// Whole-process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP listen address
    pub listen: SocketAddr,
    /// Instances in file order
    pub instances: Vec<InstanceConfig>,
}

/// One independently polled set of routes.
#[derive(Debug, Clone)]
pub struct InstanceConfig {
    pub id: String,
    pub poll_interval: Duration,
    pub surface: Surface,
    /// Validated routes in file order
    pub routes: Vec<RouteConfig>,
}

impl AppConfig {
    /// Read and parse a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse config text. Every route is validated.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;

        if raw.instances.is_empty() {
            return Err(ConfigError::NoInstances);
        }

        let instances = raw
            .instances
            .into_iter()
            .map(|(id, instance)| instance.build(id))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            listen: raw
                .listen
                .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000))),
            instances,
        })
    }
}

/// Apply the default and the minimum to a configured poll interval.
pub fn clamp_interval(secs: Option<u64>) -> Duration {
    let secs = secs.unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
    if secs < MIN_POLL_INTERVAL_SECS {
        warn!(
            configured = secs,
            minimum = MIN_POLL_INTERVAL_SECS,
            "Poll interval too short, clamping"
        );
        return Duration::from_secs(MIN_POLL_INTERVAL_SECS);
    }
    Duration::from_secs(secs)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    listen: Option<SocketAddr>,
    #[serde(default)]
    instances: IndexMap<String, RawInstance>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawInstance {
    poll_interval_secs: Option<u64>,
    #[serde(default)]
    surface: Surface,
    #[serde(default)]
    routes: IndexMap<String, RawRoute>,
}

impl RawInstance {
    fn build(self, id: String) -> Result<InstanceConfig, ConfigError> {
        let mut routes = Vec::with_capacity(self.routes.len());

        for (name, raw) in self.routes {
            let seed = match raw.url.as_deref() {
                Some(url) => {
                    let seed =
                        RouteSeed::from_planner_url(url).map_err(|message| ConfigError::InvalidUrl {
                            instance: id.clone(),
                            route: name.clone(),
                            message,
                        })?;
                    if seed.is_none() {
                        warn!(instance = %id, route = %name, "Planner URL has no route parameters, ignoring");
                    }
                    seed.unwrap_or_default()
                }
                None => RouteSeed::default(),
            };

            let route = raw.merge(name.clone(), seed);
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidRoute {
                    instance: id,
                    route: name,
                    source: ValidationError::EmptyRouteName,
                });
            }
            route.validate().map_err(|source| ConfigError::InvalidRoute {
                instance: id.clone(),
                route: name.clone(),
                source,
            })?;
            routes.push(route);
        }

        Ok(InstanceConfig {
            poll_interval: clamp_interval(self.poll_interval_secs),
            surface: self.surface,
            routes,
            id,
        })
    }
}

/// One route table. Every field is optional so a `url` seed can fill gaps.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRoute {
    url: Option<String>,
    from: Option<String>,
    from_type: Option<String>,
    from_position: Option<String>,
    from_locality: Option<String>,
    to: Option<String>,
    to_type: Option<String>,
    to_position: Option<String>,
    to_locality: Option<String>,
    date: Option<String>,
    time: Option<String>,
    departure_option: Option<DepartureOption>,
    transport_options: Option<TransportModes>,
    walk_speed: Option<WalkSpeed>,
    max_connections: Option<u32>,
    max_walking_distance: Option<String>,
}

impl RawRoute {
    /// Explicit keys, then the seed, then defaults.
    fn merge(self, name: String, seed: RouteSeed) -> RouteConfig {
        let from = Place {
            location: self.from.or(seed.from).unwrap_or_default(),
            kind: self
                .from_type
                .or(seed.from_type)
                .unwrap_or_else(|| DEFAULT_PLACE_TYPE.to_string()),
            position: self.from_position.or(seed.from_position).unwrap_or_default(),
            locality: self.from_locality.or(seed.from_locality).unwrap_or_default(),
        };
        let to = Place {
            location: self.to.or(seed.to).unwrap_or_default(),
            kind: self
                .to_type
                .or(seed.to_type)
                .unwrap_or_else(|| DEFAULT_PLACE_TYPE.to_string()),
            position: self.to_position.or(seed.to_position).unwrap_or_default(),
            locality: self.to_locality.or(seed.to_locality).unwrap_or_default(),
        };

        let mut route = RouteConfig::new(name, from, to);
        route.date = self
            .date
            .or(seed.date)
            .map(|d| DateSpec::parse(&d))
            .unwrap_or_default();
        route.time = self
            .time
            .or(seed.time)
            .map(|t| TimeSpec::parse(&t))
            .unwrap_or_default();
        route.departure_option = self
            .departure_option
            .or(seed.departure_option)
            .unwrap_or_default();
        if let Some(modes) = self.transport_options.or(seed.transport_options) {
            route.transport_options = modes;
        }
        route.walk_speed = self.walk_speed.or(seed.walk_speed).unwrap_or_default();
        route.max_connections = self.max_connections.or(seed.max_connections);
        route.max_walking_distance = self.max_walking_distance.or(seed.max_walking_distance);
        route
    }
}

/// Route fields recovered from a Journey Planner URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteSeed {
    pub from: Option<String>,
    pub from_type: Option<String>,
    pub from_position: Option<String>,
    pub from_locality: Option<String>,
    pub to: Option<String>,
    pub to_type: Option<String>,
    pub to_position: Option<String>,
    pub to_locality: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub departure_option: Option<DepartureOption>,
    pub transport_options: Option<TransportModes>,
    pub walk_speed: Option<WalkSpeed>,
    pub max_connections: Option<u32>,
    pub max_walking_distance: Option<String>,
}

impl RouteSeed {
    /// Parse a planner URL such as
    /// `https://www.transperth.wa.gov.au/Journey-Planner/Results?from=...`.
    ///
    /// Returns `Ok(None)` when the URL is not a planner page or carries no
    /// recognised parameters, and `Err` when it is not a URL at all.
    /// Blank parameters are ignored and the first occurrence of a key wins.
    pub fn from_planner_url(url: &str) -> Result<Option<Self>, String> {
        let url = Url::parse(url.trim()).map_err(|e| e.to_string())?;
        if !url.path().contains("Journey-Planner") {
            return Ok(None);
        }

        let mut params: IndexMap<String, String> = IndexMap::new();
        for (key, value) in url.query_pairs() {
            if !value.is_empty() {
                params.entry(key.into_owned()).or_insert_with(|| value.into_owned());
            }
        }

        let text = |key: &str| params.get(key).cloned();

        let modes: TransportModes = params
            .keys()
            .filter_map(|key| mode_from_legacy_flag(key))
            .collect();

        let seed = Self {
            from: text("from"),
            from_type: text("fromtype"),
            from_position: text("fromposition"),
            from_locality: text("fromlocality"),
            to: text("to"),
            to_type: text("totype"),
            to_position: text("toposition"),
            to_locality: text("tolocality"),
            date: text("date"),
            time: text("time"),
            departure_option: params
                .get("departureOption")
                .and_then(|d| DepartureOption::from_upstream_token(d)),
            transport_options: (!modes.is_empty()).then_some(modes),
            walk_speed: params.get("walkSpeed").and_then(|w| WalkSpeed::parse(w)),
            max_connections: params
                .get("maxConnections")
                .and_then(|m| m.trim().parse().ok()),
            max_walking_distance: text("maxWalkingDistance"),
        };

        Ok((seed != Self::default()).then_some(seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransportMode;
    use std::io::Write;

    const PLANNER_URL: &str = "https://www.transperth.wa.gov.au/Journey-Planner/Results\
        ?from=Perth+Busport&fromtype=stops&fromposition=-31.951%2C115.853&fromlocality=Perth\
        &to=Curtin+University&toposition=-32.005%2C115.894\
        &date=2026-01-03&time=08%3A15&departureOption=ArriveBy\
        &bus=on&ferry=on&walkSpeed=FAST&maxConnections=Direct&maxWalkingDistance=1500m";

    const MINIMAL: &str = r#"
        [instances.home.routes.work]
        from = "Perth Busport"
        from_position = "-31.951,115.853"
        to = "Curtin University"
        to_position = "-32.005,115.894"
    "#;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = AppConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.listen, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.instances.len(), 1);

        let instance = &config.instances[0];
        assert_eq!(instance.id, "home");
        assert_eq!(instance.poll_interval, Duration::from_secs(300));
        assert_eq!(instance.surface, Surface::Api);

        let route = &instance.routes[0];
        assert_eq!(route.name, "work");
        assert_eq!(route.from.kind, DEFAULT_PLACE_TYPE);
        assert_eq!(route.date, DateSpec::Today);
        assert_eq!(route.time, TimeSpec::Now);
        assert_eq!(route.transport_options, TransportModes::bus_and_train());
        assert_eq!(route.walk_speed, WalkSpeed::Normal);
        assert_eq!(route.max_connections, None);
    }

    #[test]
    fn full_route_table() {
        let config = AppConfig::from_toml_str(
            r#"
            listen = "0.0.0.0:8080"

            [instances.home]
            poll_interval_secs = 120
            surface = "html"

            [instances.home.routes.gym]
            from = "Home"
            from_type = "stops"
            from_position = "1,2"
            from_locality = "Bentley"
            to = "Gym"
            to_position = "3,4"
            date = "tomorrow"
            time = "06:30"
            departure_option = "arrive_by"
            transport_options = ["ferry", "school_bus"]
            walk_speed = "slow"
            max_connections = 2
            max_walking_distance = "800m"

            [instances.home.routes.beach]
            from = "Home"
            from_position = "1,2"
            to = "Cottesloe"
            to_position = "5,6"
            "#,
        )
        .unwrap();

        assert_eq!(config.listen, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        let instance = &config.instances[0];
        assert_eq!(instance.poll_interval, Duration::from_secs(120));
        assert_eq!(instance.surface, Surface::Html);
        assert_eq!(
            instance.routes.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["gym", "beach"]
        );

        let gym = &instance.routes[0];
        assert_eq!(gym.from.kind, "stops");
        assert_eq!(gym.from.locality, "Bentley");
        assert_eq!(gym.date, DateSpec::Tomorrow);
        assert_eq!(gym.time, TimeSpec::Fixed("06:30".into()));
        assert_eq!(gym.departure_option, DepartureOption::ArriveBy);
        assert_eq!(
            gym.transport_options,
            TransportModes::new([TransportMode::Ferry, TransportMode::SchoolBus])
        );
        assert_eq!(gym.walk_speed, WalkSpeed::Slow);
        assert_eq!(gym.max_connections, Some(2));
        assert_eq!(gym.max_walking_distance.as_deref(), Some("800m"));
    }

    #[test]
    fn interval_is_clamped() {
        assert_eq!(clamp_interval(None), Duration::from_secs(300));
        assert_eq!(clamp_interval(Some(10)), Duration::from_secs(60));
        assert_eq!(clamp_interval(Some(60)), Duration::from_secs(60));
        assert_eq!(clamp_interval(Some(900)), Duration::from_secs(900));
    }

    #[test]
    fn missing_position_is_rejected() {
        let err = AppConfig::from_toml_str(
            r#"
            [instances.home.routes.work]
            from = "Perth Busport"
            from_position = "-31.951,115.853"
            to = "Curtin University"
            "#,
        )
        .unwrap_err();

        match err {
            ConfigError::InvalidRoute { instance, route, source } => {
                assert_eq!(instance, "home");
                assert_eq!(route, "work");
                assert_eq!(source, ValidationError::MissingField("to_position"));
            }
            other => panic!("expected invalid route, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_route_names_are_rejected() {
        let text = format!("{MINIMAL}\n[instances.home.routes.work]\nfrom = \"x\"\n");
        assert!(matches!(
            AppConfig::from_toml_str(&text),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn unknown_keys_and_surfaces_are_rejected() {
        let text = MINIMAL.replace("[instances.home.routes.work]", "[instances.home.routes.work]\nfrm = \"typo\"");
        assert!(matches!(AppConfig::from_toml_str(&text), Err(ConfigError::Parse(_))));

        let text = format!("[instances.home]\nsurface = \"soap\"\n{MINIMAL}");
        assert!(matches!(AppConfig::from_toml_str(&text), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn empty_config_is_rejected() {
        assert!(matches!(
            AppConfig::from_toml_str(""),
            Err(ConfigError::NoInstances)
        ));
    }

    #[test]
    fn seed_from_planner_url() {
        let seed = RouteSeed::from_planner_url(PLANNER_URL).unwrap().unwrap();

        assert_eq!(seed.from.as_deref(), Some("Perth Busport"));
        assert_eq!(seed.from_type.as_deref(), Some("stops"));
        assert_eq!(seed.from_position.as_deref(), Some("-31.951,115.853"));
        assert_eq!(seed.from_locality.as_deref(), Some("Perth"));
        assert_eq!(seed.to_type, None);
        assert_eq!(seed.time.as_deref(), Some("08:15"));
        assert_eq!(seed.departure_option, Some(DepartureOption::ArriveBy));
        assert_eq!(
            seed.transport_options,
            Some(TransportModes::new([TransportMode::Bus, TransportMode::Ferry]))
        );
        assert_eq!(seed.walk_speed, Some(WalkSpeed::Fast));
        assert_eq!(seed.max_connections, None);
        assert_eq!(seed.max_walking_distance.as_deref(), Some("1500m"));
    }

    #[test]
    fn seed_ignores_unrelated_urls() {
        assert_eq!(
            RouteSeed::from_planner_url("https://www.transperth.wa.gov.au/Timetables?from=x").unwrap(),
            None
        );
        assert_eq!(
            RouteSeed::from_planner_url("https://www.transperth.wa.gov.au/Journey-Planner?utm=1")
                .unwrap(),
            None
        );
        assert!(RouteSeed::from_planner_url("not a url").is_err());
    }

    #[test]
    fn seed_numeric_connections() {
        let seed = RouteSeed::from_planner_url(
            "https://www.transperth.wa.gov.au/Journey-Planner/Results?maxConnections=3&walkSpeed=brisk",
        )
        .unwrap()
        .unwrap();
        assert_eq!(seed.max_connections, Some(3));
        assert_eq!(seed.walk_speed, None);
    }

    #[test]
    fn explicit_keys_beat_the_seed() {
        let text = format!(
            r#"
            [instances.home.routes.work]
            url = "{PLANNER_URL}"
            to = "Bentley Campus"
            walk_speed = "normal"
            "#
        );
        let config = AppConfig::from_toml_str(&text).unwrap();
        let route = &config.instances[0].routes[0];

        assert_eq!(route.from.location, "Perth Busport");
        assert_eq!(route.from.kind, "stops");
        assert_eq!(route.to.location, "Bentley Campus");
        assert_eq!(route.to.position, "-32.005,115.894");
        assert_eq!(route.to.kind, DEFAULT_PLACE_TYPE);
        assert_eq!(route.walk_speed, WalkSpeed::Normal);
        assert_eq!(route.departure_option, DepartureOption::ArriveBy);
        assert_eq!(route.date, DateSpec::Fixed("2026-01-03".into()));
        assert_eq!(route.max_walking_distance.as_deref(), Some("1500m"));
    }

    #[test]
    fn bad_seed_url_is_a_config_error() {
        let text = r#"
            [instances.home.routes.work]
            url = "::::"
            from = "a"
            from_position = "1,2"
            to = "b"
            to_position = "3,4"
        "#;
        assert!(matches!(
            AppConfig::from_toml_str(text),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.instances[0].routes.len(), 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }
}
