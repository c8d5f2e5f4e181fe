//! In-memory page driver that replays a scripted chain table.
//!
//! Each scroll (`window.scrollBy`) advances to the next pass of visible rows;
//! after the last pass the final one keeps repeating, like a list that has
//! stopped yielding new rows.

use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing_subscriber::fmt::MakeWriter;

use super::{DriverError, DriverLauncher, DriverResult, PageDriver};
use crate::config::TableSelectors;

/// One visible row. Column 0 holds the rank and name; `columns[i]` is the
/// text of column `i + 1`, `None` when reading it fails.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedRow {
    pub rank: Option<String>,
    pub name: Option<String>,
    pub columns: Vec<Option<String>>,
    pub unreadable: bool,
}

impl ScriptedRow {
    pub fn new(rank: &str, name: &str) -> Self {
        Self {
            rank: Some(rank.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    /// A row laid out for headers `["Rank", "Name", "Protocols", "TVL"]`.
    pub fn chain(rank: u64, name: &str, protocols: &str, tvl: &str) -> Self {
        Self::new(&rank.to_string(), name)
            .column(3, Some(protocols))
            .column(4, Some(tvl))
    }

    /// Set the text of column `index` (1-based past the rank column).
    pub fn column(mut self, index: usize, text: Option<&str>) -> Self {
        assert!(index > 0, "column 0 is the rank/name column");
        if self.columns.len() < index {
            self.columns.resize(index, Some(String::new()));
        }
        self.columns[index - 1] = text.map(str::to_string);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedPage {
    pub selectors: TableSelectors,
    pub total: Option<String>,
    pub headers: Vec<String>,
    pub headers_fail: bool,
    pub rows_fail: bool,
    pub passes: Vec<Vec<ScriptedRow>>,
}

impl ScriptedPage {
    pub fn new(total: &str, headers: &[&str], passes: Vec<Vec<ScriptedRow>>) -> Self {
        Self {
            selectors: TableSelectors::default(),
            total: Some(total.to_string()),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            headers_fail: false,
            rows_fail: false,
            passes,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Total,
    Header(usize),
    Row { pass: usize, row: usize },
    Column { pass: usize, row: usize, col: usize },
    Rank { pass: usize, row: usize },
    Name { pass: usize, row: usize },
}

/// Everything the scripted drivers were asked to do.
#[derive(Debug, Clone, Default)]
pub(crate) struct Journal {
    pub launches: Vec<Option<String>>,
    pub navigations: Vec<String>,
    pub scripts: Vec<String>,
    pub scrolled_into_view: usize,
    pub closes: usize,
}

impl Journal {
    /// Distances of every `window.scrollBy(0, N)` issued, in order.
    pub fn scroll_distances(&self) -> Vec<u64> {
        self.scripts
            .iter()
            .filter_map(|s| {
                s.strip_prefix("window.scrollBy(0, ")?
                    .strip_suffix(");")?
                    .parse()
                    .ok()
            })
            .collect()
    }
}

pub(crate) struct ScriptedDriver {
    page: ScriptedPage,
    pass: usize,
    proxy: Option<String>,
    fail_navigation: bool,
    closed: bool,
    journal: Arc<Mutex<Journal>>,
}

impl ScriptedDriver {
    pub fn new(page: ScriptedPage) -> Self {
        Self {
            page,
            pass: 0,
            proxy: None,
            fail_navigation: false,
            closed: false,
            journal: Arc::default(),
        }
    }

    pub fn journal(&self) -> Journal {
        self.journal.lock().unwrap().clone()
    }

    fn visible_pass(&self) -> Option<&Vec<ScriptedRow>> {
        let last = self.page.passes.len().checked_sub(1)?;
        self.page.passes.get(self.pass.min(last))
    }

    fn row(&self, pass: usize, row: usize) -> DriverResult<&ScriptedRow> {
        self.page
            .passes
            .get(pass)
            .and_then(|rows| rows.get(row))
            .ok_or(DriverError::Stale)
    }
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    type Element = Node;

    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        self.journal.lock().unwrap().navigations.push(url.to_string());
        if self.fail_navigation {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_PROXY_CONNECTION_FAILED".to_string(),
            });
        }
        Ok(())
    }

    async fn find_element(&self, selector: &str) -> DriverResult<Node> {
        if selector == self.page.selectors.total_count && self.page.total.is_some() {
            return Ok(Node::Total);
        }
        Err(DriverError::NotFound(selector.to_string()))
    }

    async fn query(&self, selector: &str) -> DriverResult<Vec<Node>> {
        let selectors = &self.page.selectors;
        if selector == selectors.header_cells {
            if self.page.headers_fail {
                return Err(DriverError::Protocol("header lookup failed".to_string()));
            }
            return Ok((0..self.page.headers.len()).map(Node::Header).collect());
        }
        if selector == selectors.rows {
            if self.page.rows_fail {
                return Err(DriverError::Protocol("row lookup failed".to_string()));
            }
            let pass = self.pass.min(self.page.passes.len().saturating_sub(1));
            let count = self.visible_pass().map_or(0, Vec::len);
            return Ok((0..count).map(|row| Node::Row { pass, row }).collect());
        }
        Ok(Vec::new())
    }

    async fn query_within(&self, root: &Node, selector: &str) -> DriverResult<Vec<Node>> {
        let selectors = &self.page.selectors;
        match *root {
            Node::Row { pass, row } if selector == selectors.row_columns => {
                let scripted = self.row(pass, row)?;
                if scripted.unreadable {
                    return Err(DriverError::Stale);
                }
                Ok((0..=scripted.columns.len())
                    .map(|col| Node::Column { pass, row, col })
                    .collect())
            }
            Node::Column { pass, row, col: 0 } if selector == selectors.rank => {
                let present = self.row(pass, row)?.rank.is_some();
                Ok(present
                    .then_some(Node::Rank { pass, row })
                    .into_iter()
                    .collect())
            }
            Node::Column { pass, row, col: 0 } if selector == selectors.name => {
                let present = self.row(pass, row)?.name.is_some();
                Ok(present
                    .then_some(Node::Name { pass, row })
                    .into_iter()
                    .collect())
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn text(&self, element: &Node) -> DriverResult<String> {
        match *element {
            Node::Total => self.page.total.clone().ok_or(DriverError::Stale),
            Node::Header(i) => self.page.headers.get(i).cloned().ok_or(DriverError::Stale),
            Node::Row { .. } | Node::Column { col: 0, .. } => Ok(String::new()),
            Node::Column { pass, row, col } => self
                .row(pass, row)?
                .columns
                .get(col - 1)
                .cloned()
                .flatten()
                .ok_or(DriverError::Stale),
            Node::Rank { pass, row } => self.row(pass, row)?.rank.clone().ok_or(DriverError::Stale),
            Node::Name { pass, row } => self.row(pass, row)?.name.clone().ok_or(DriverError::Stale),
        }
    }

    async fn scroll_into_view(&self, _element: &Node) -> DriverResult<()> {
        self.journal.lock().unwrap().scrolled_into_view += 1;
        Ok(())
    }

    async fn execute_script(&mut self, script: &str) -> DriverResult<()> {
        self.journal.lock().unwrap().scripts.push(script.to_string());
        if script.starts_with("window.scrollBy") {
            self.pass += 1;
        }
        Ok(())
    }

    fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    async fn close(&mut self) -> DriverResult<()> {
        if !self.closed {
            self.closed = true;
            self.journal.lock().unwrap().closes += 1;
        }
        Ok(())
    }
}

/// Hands out [`ScriptedDriver`]s sharing one journal.
pub(crate) struct ScriptedLauncher {
    page: ScriptedPage,
    journal: Arc<Mutex<Journal>>,
    fail_proxy: bool,
    fail_launch: bool,
}

impl ScriptedLauncher {
    pub fn new(page: ScriptedPage) -> Self {
        Self {
            page,
            journal: Arc::default(),
            fail_proxy: false,
            fail_launch: false,
        }
    }

    /// Proxied drivers fail every navigation.
    pub fn failing_proxy(mut self) -> Self {
        self.fail_proxy = true;
        self
    }

    pub fn failing_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    pub fn journal(&self) -> Journal {
        self.journal.lock().unwrap().clone()
    }
}

#[async_trait]
impl DriverLauncher for ScriptedLauncher {
    type Driver = ScriptedDriver;

    async fn launch(&self, proxy: Option<&str>) -> DriverResult<ScriptedDriver> {
        self.journal
            .lock()
            .unwrap()
            .launches
            .push(proxy.map(str::to_string));
        if self.fail_launch {
            return Err(DriverError::Launch("no browser in tests".to_string()));
        }
        Ok(ScriptedDriver {
            page: self.page.clone(),
            pass: 0,
            proxy: proxy.map(str::to_string),
            fail_navigation: self.fail_proxy && proxy.is_some(),
            closed: false,
            journal: Arc::clone(&self.journal),
        })
    }
}

/// Shared buffer collecting formatted log output.
#[derive(Clone, Default)]
pub(crate) struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Capture log events on the current thread until the guard drops.
pub(crate) fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}
