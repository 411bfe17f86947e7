//! Request routing for the board API.

use std::str::FromStr;

use crate::grid::{Encoding, Seed};
use crate::shard::ShardCoord;

/// Board edge used by `/board` when no width is given.
const DEFAULT_WIDTH: usize = 100;

/// A parsed API request. Anything else is a static file lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Help,
    Board(BoardQuery),
    Step { count: u64, encoding: Encoding },
    Snapshot { encoding: Encoding },
    Shard { coord: ShardCoord, encoding: Encoding },
    Quit,
    Static,
}

/// Parameters of `/board`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardQuery {
    pub width: usize,
    pub height: usize,
    pub seed: Seed,
    pub encoding: Encoding,
}

impl Route {
    /// Parse a request URL such as `/step?n=5`.
    ///
    /// Malformed parameters are reported as a message for a 400 response.
    pub fn parse(url: &str) -> Result<Self, String> {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let query = Query::parse(query);

        let route = match path.trim_end_matches('/') {
            "" | "/help" => Self::Help,
            "/board" => Self::Board(BoardQuery::from_query(&query)?),
            "/step" => Self::Step {
                count: query.get_or("n", 1)?,
                encoding: query.get_or("encoding", Encoding::Delta)?,
            },
            "/snapshot" => Self::Snapshot {
                encoding: query.get_or("encoding", Encoding::Delta)?,
            },
            "/shard" => Self::Shard {
                coord: ShardCoord::new(query.require("row")?, query.require("col")?),
                encoding: query.get_or("encoding", Encoding::Delta)?,
            },
            "/quit" => Self::Quit,
            _ => Self::Static,
        };
        Ok(route)
    }
}

impl BoardQuery {
    fn from_query(query: &Query) -> Result<Self, String> {
        let width = query.get_or("width", DEFAULT_WIDTH)?;
        let height = query.get_or("height", width)?;
        let seed = match query.get("pattern") {
            Some(name) => Seed::Pattern {
                name: name.to_string(),
                row: query.get_or("row", 0)?,
                col: query.get_or("col", 0)?,
            },
            None => {
                let density: f64 = query.get_or("density", 0.0)?;
                if !(0.0..=1.0).contains(&density) {
                    return Err(format!("density {density} is not between 0 and 1"));
                }
                Seed::Random {
                    density,
                    seed: query.get_or("seed", 32)?,
                }
            }
        };
        Ok(Self {
            width,
            height,
            seed,
            encoding: query.get_or("encoding", Encoding::Delta)?,
        })
    }
}

/// Decoded `key=value` pairs of a query string.
#[derive(Debug, Default)]
struct Query(Vec<(String, String)>);

impl Query {
    fn parse(raw: &str) -> Self {
        Self(url::form_urlencoded::parse(raw.as_bytes()).into_owned().collect())
    }

    /// Last value for `key`, ignoring empty ones.
    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.as_str())
    }

    fn get_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, String> {
        match self.get(key) {
            Some(raw) => raw
                .parse()
                .map_err(|_| format!("invalid value `{raw}` for `{key}`")),
            None => Ok(default),
        }
    }

    fn require<T: FromStr>(&self, key: &str) -> Result<T, String> {
        let raw = self
            .get(key)
            .ok_or_else(|| format!("missing parameter `{key}`"))?;
        raw.parse()
            .map_err(|_| format!("invalid value `{raw}` for `{key}`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_routes() {
        assert_eq!(Route::parse("/"), Ok(Route::Help));
        assert_eq!(Route::parse("/help"), Ok(Route::Help));
        assert_eq!(Route::parse("/help/"), Ok(Route::Help));
        assert_eq!(Route::parse("/life.js"), Ok(Route::Static));
    }

    #[test]
    fn test_board_defaults() {
        let Ok(Route::Board(query)) = Route::parse("/board") else {
            panic!("expected board route");
        };
        assert_eq!((query.width, query.height), (100, 100));
        assert_eq!(
            query.seed,
            Seed::Random {
                density: 0.0,
                seed: 32
            }
        );
        assert_eq!(query.encoding, Encoding::Delta);
    }

    #[test]
    fn test_board_parameters() {
        let route = Route::parse("/board?width=40&height=20&density=0.25&seed=7&encoding=columns");
        let Ok(Route::Board(query)) = route else {
            panic!("expected board route");
        };
        assert_eq!((query.width, query.height), (40, 20));
        assert_eq!(
            query.seed,
            Seed::Random {
                density: 0.25,
                seed: 7
            }
        );
        assert_eq!(query.encoding, Encoding::Columns);
    }

    #[test]
    fn test_board_pattern_is_url_decoded() {
        let Ok(Route::Board(query)) = Route::parse("/board?width=12&pattern=r%2Dpentomino&row=3")
        else {
            panic!("expected board route");
        };
        assert_eq!(query.height, 12);
        assert_eq!(
            query.seed,
            Seed::Pattern {
                name: "r-pentomino".into(),
                row: 3,
                col: 0
            }
        );
    }

    #[test]
    fn test_bad_parameters() {
        assert!(Route::parse("/board?width=abc").is_err());
        assert!(Route::parse("/board?density=1.5").is_err());
        assert!(Route::parse("/step?n=-1").is_err());
        assert!(Route::parse("/shard?row=1").is_err());
        assert!(Route::parse("/snapshot?encoding=rle").is_err());
    }

    #[test]
    fn test_step_and_shard() {
        assert_eq!(
            Route::parse("/step?n=5"),
            Ok(Route::Step {
                count: 5,
                encoding: Encoding::Delta
            })
        );
        assert_eq!(
            Route::parse("/step?n="),
            Ok(Route::Step {
                count: 1,
                encoding: Encoding::Delta
            })
        );
        assert_eq!(
            Route::parse("/shard?row=1&col=0"),
            Ok(Route::Shard {
                coord: ShardCoord::new(1, 0),
                encoding: Encoding::Delta
            })
        );
    }
}
