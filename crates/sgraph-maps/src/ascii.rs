//! Text maps.
//!
//! An [`AsciiMap`] is a rectangular block of characters, one per cell. The
//! parser also accepts the four-line `.map` header used by the common grid
//! pathfinding benchmarks (`type octile`, `height H`, `width W`, `map`)
//! and checks the body against it.

use std::fmt;

use sgraph_core::{Grid, GridError, Point};

/// Characters for traversable cells.
pub const PASSABLE: &str = ".GS";
/// Characters for blocked cells.
pub const BLOCKED: &str = "@OTW#";

/// Whether `ch` is a traversable cell, `None` for unknown characters.
pub fn is_passable(ch: char) -> Option<bool> {
    if PASSABLE.contains(ch) {
        Some(true)
    } else if BLOCKED.contains(ch) {
        Some(false)
    } else {
        None
    }
}

/// Errors that can occur when parsing a text map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapParseError {
    /// The body has no cells.
    Empty,
    /// Lines have inconsistent widths.
    InconsistentSize { line: usize, expected: usize, actual: usize },
    /// A character outside [`PASSABLE`] and [`BLOCKED`] was found.
    InvalidRune { ch: char, pos: Point },
    /// A header line is missing or malformed.
    BadHeader(String),
    /// The body does not match the size declared in the header.
    SizeMismatch { declared: Point, actual: Point },
    /// The grid could not be built.
    Grid(GridError),
}

impl fmt::Display for MapParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "map: no cells"),
            Self::InconsistentSize { line, expected, actual } => {
                write!(f, "map: line {line} has {actual} cells, expected {expected}")
            }
            Self::InvalidRune { ch, pos } => {
                write!(f, "map contains invalid rune \u{201c}{ch}\u{201d} at {pos}")
            }
            Self::BadHeader(line) => write!(f, "map: bad header line {line:?}"),
            Self::SizeMismatch { declared, actual } => write!(
                f,
                "map: header declares {}x{}, body is {}x{}",
                declared.x, declared.y, actual.x, actual.y
            ),
            Self::Grid(e) => write!(f, "map: {e}"),
        }
    }
}

impl std::error::Error for MapParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Grid(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GridError> for MapParseError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}

/// A parsed text map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsciiMap {
    content: String,
    size: Point,
}

impl AsciiMap {
    /// Parse a map body, with or without a `.map` header.
    ///
    /// Leading and trailing whitespace is trimmed from the whole string,
    /// and trailing `\r` from each line.
    pub fn new(s: &str) -> Result<Self, MapParseError> {
        let s = s.trim();
        let mut lines = s.lines().map(|l| l.trim_end_matches('\r')).peekable();
        let has_header = lines.peek().is_some_and(|l| l.starts_with("type"));
        let declared = if has_header {
            Some(parse_header(&mut lines)?)
        } else {
            None
        };

        let mut content = String::with_capacity(s.len());
        let mut w: Option<usize> = None;
        let mut h = 0usize;
        for (y, line) in lines.enumerate() {
            let mut x = 0usize;
            for ch in line.chars() {
                if is_passable(ch).is_none() {
                    return Err(MapParseError::InvalidRune {
                        ch,
                        pos: Point::new(x as i32, y as i32),
                    });
                }
                x += 1;
            }
            match w {
                None => w = Some(x),
                Some(expected) if expected != x => {
                    return Err(MapParseError::InconsistentSize {
                        line: y,
                        expected,
                        actual: x,
                    });
                }
                Some(_) => {}
            }
            if y > 0 {
                content.push('\n');
            }
            content.push_str(line);
            h += 1;
        }
        let w = w.unwrap_or(0);
        if w == 0 || h == 0 {
            return Err(MapParseError::Empty);
        }
        let size = Point::new(w as i32, h as i32);
        match declared {
            Some(declared) if declared != size => {
                Err(MapParseError::SizeMismatch { declared, actual: size })
            }
            _ => Ok(Self { content, size }),
        }
    }

    /// The map body without header.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// (width, height) in cells.
    pub fn size(&self) -> Point {
        self.size
    }

    /// Iterate over all positions and their characters.
    pub fn iter(&self) -> impl Iterator<Item = (Point, char)> + '_ {
        self.content.lines().enumerate().flat_map(|(y, line)| {
            line.chars()
                .enumerate()
                .map(move |(x, ch)| (Point::new(x as i32, y as i32), ch))
        })
    }

    /// Build the traversability grid.
    pub fn to_grid(&self) -> Result<Grid, MapParseError> {
        let bits: Vec<bool> = self
            .iter()
            .map(|(_, ch)| is_passable(ch).unwrap_or(false))
            .collect();
        Ok(Grid::from_bits(&bits, self.size.x, self.size.y)?)
    }
}

fn parse_header<'a>(lines: &mut impl Iterator<Item = &'a str>) -> Result<Point, MapParseError> {
    let mut field = |name: &str| -> Result<&'a str, MapParseError> {
        let line = lines.next().unwrap_or_default();
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(key), value, None) if key == name => Ok(value.unwrap_or_default()),
            _ => Err(MapParseError::BadHeader(line.to_string())),
        }
    };
    let kind = field("type")?;
    if kind != "octile" {
        return Err(MapParseError::BadHeader(format!("type {kind}")));
    }
    let number = |v: &str| {
        v.parse::<i32>()
            .map_err(|_| MapParseError::BadHeader(v.to_string()))
    };
    let height = number(field("height")?)?;
    let width = number(field("width")?)?;
    field("map")?;
    Ok(Point::new(width, height))
}

/// Parse a text map straight into a grid.
pub fn parse_grid(s: &str) -> Result<Grid, MapParseError> {
    AsciiMap::new(s)?.to_grid()
}

/// Render a grid with `.` for traversable and `@` for blocked cells.
pub fn render(grid: &Grid) -> String {
    let mut out = String::with_capacity(grid.bounds().len() + grid.height() as usize);
    for y in 0..grid.height() {
        if y > 0 {
            out.push('\n');
        }
        for x in 0..grid.width() {
            out.push(if grid.is_traversable(Point::new(x, y)) { '.' } else { '@' });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOM: &str = "\
@@@@@@
@.G..@
@.TT.@
@S...@
@@@@@@";

    #[test]
    fn parses_body_into_grid() {
        let map = AsciiMap::new(ROOM).unwrap();
        assert_eq!(map.size(), Point::new(6, 5));
        let grid = map.to_grid().unwrap();
        assert!(grid.is_traversable(Point::new(1, 1)));
        assert!(grid.is_traversable(Point::new(2, 1)));
        assert!(grid.is_traversable(Point::new(1, 3)));
        assert!(!grid.is_traversable(Point::new(2, 2)));
        assert!(!grid.is_traversable(Point::new(0, 0)));
        assert_eq!(grid.count_traversable(), 10);
    }

    #[test]
    fn header_is_checked() {
        let text = format!("type octile\nheight 5\nwidth 6\nmap\n{ROOM}\n");
        let grid = parse_grid(&text).unwrap();
        assert_eq!((grid.width(), grid.height()), (6, 5));

        let wrong = format!("type octile\nheight 4\nwidth 6\nmap\n{ROOM}");
        assert!(matches!(
            parse_grid(&wrong),
            Err(MapParseError::SizeMismatch { .. })
        ));

        let bad = format!("type octile\nheight five\nwidth 6\nmap\n{ROOM}");
        assert!(matches!(parse_grid(&bad), Err(MapParseError::BadHeader(_))));
    }

    #[test]
    fn rejects_ragged_and_unknown() {
        assert!(matches!(
            AsciiMap::new("...\n..\n..."),
            Err(MapParseError::InconsistentSize { line: 1, expected: 3, actual: 2 })
        ));
        assert_eq!(
            AsciiMap::new("..\n.x"),
            Err(MapParseError::InvalidRune {
                ch: 'x',
                pos: Point::new(1, 1)
            })
        );
        assert_eq!(AsciiMap::new("  \n "), Err(MapParseError::Empty));
    }

    #[test]
    fn crlf_lines_are_accepted() {
        let grid = parse_grid("..\r\n.@\r\n").unwrap();
        assert!(!grid.is_traversable(Point::new(1, 1)));
        assert_eq!(grid.count_traversable(), 3);
    }

    #[test]
    fn render_matches_input() {
        let text = "..@\n@..\n...";
        assert_eq!(render(&parse_grid(text).unwrap()), text);
    }
}
