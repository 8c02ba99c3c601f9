//! Local dataset library: reads documents, queries and qrels from disk.
//!
//! A dataset identifier such as `msmarco-passage/dev` resolves to the
//! directory `<root>/msmarco-passage/dev`, which holds:
//!
//! - `docs.jsonl`: one JSON object per line, identified by `doc_id`
//! - `queries.jsonl`: one JSON object per line, identified by `query_id`
//! - `qrels.jsonl` (`query_id`, `doc_id`, `relevance`), or `qrels.trec` in
//!   TREC format (`qid iteration docid relevance`)
//! - `metadata.json` (optional): `{"docs": {"count": N}, ...}`
//!
//! Records are read line by line, so only the current batch is ever held in
//! memory. Which JSON field holds a text, title or description is chosen by
//! [`FieldMapping`].
//!
//! Counts come from `metadata.json`. For a stage it does not list, the count
//! methods scan the whole record file once, so the file is read twice in
//! total (count, then upload). Ship `metadata.json` with large corpora.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::contract::{DatasetSource, Document, QRel, Query, RecordIter};

const DOCS_FILE: &str = "docs.jsonl";
const QUERIES_FILE: &str = "queries.jsonl";
const QRELS_JSONL_FILE: &str = "qrels.jsonl";
const QRELS_TREC_FILE: &str = "qrels.trec";
const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("dataset '{id}' not found (looked in {path:?})")]
    DatasetNotFound { id: String, path: PathBuf },

    #[error("dataset has no {kind} (expected {path:?})")]
    MissingFile { kind: &'static str, path: PathBuf },

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path:?}:{line}: malformed record: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("{path:?}:{line}: record has no attribute '{field}'")]
    MissingField {
        path: PathBuf,
        line: usize,
        field: String,
    },

    #[error("{path:?}:{line}: attribute '{field}' is not a string")]
    InvalidField {
        path: PathBuf,
        line: usize,
        field: String,
    },
}

/// Names of the record attributes holding each text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub document_text: String,
    pub document_title: String,
    pub query_text: String,
    pub query_description: String,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            document_text: "text".into(),
            document_title: "title".into(),
            query_text: "text".into(),
            query_description: "description".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    docs: Option<Count>,
    queries: Option<Count>,
    qrels: Option<Count>,
}

#[derive(Debug, Deserialize)]
struct Count {
    count: usize,
}

/// A dataset opened from the local library.
#[derive(Debug)]
pub struct LocalDataset {
    dir: PathBuf,
    fields: FieldMapping,
    metadata: Metadata,
}

impl LocalDataset {
    /// Resolve `dataset_id` under `root` and read its metadata, if any.
    ///
    /// Fails if the identifier does not name a directory.
    pub fn open(
        root: impl AsRef<Path>,
        dataset_id: &str,
        fields: FieldMapping,
    ) -> Result<Self, SourceError> {
        let dir = dataset_id
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(root.as_ref().to_path_buf(), |dir, part| dir.join(part));
        if dataset_id.trim_matches('/').is_empty() || !dir.is_dir() {
            return Err(SourceError::DatasetNotFound {
                id: dataset_id.to_string(),
                path: dir,
            });
        }

        let meta_path = dir.join(METADATA_FILE);
        let metadata = if meta_path.is_file() {
            let raw = fs::read_to_string(&meta_path).map_err(|source| SourceError::Io {
                path: meta_path.clone(),
                source,
            })?;
            serde_json::from_str(&raw).map_err(|e| SourceError::Malformed {
                path: meta_path.clone(),
                line: e.line(),
                reason: e.to_string(),
            })?
        } else {
            Metadata::default()
        };

        info!(dataset = dataset_id, dir = %dir.display(), "Opened local dataset");
        debug!(?metadata, ?fields, "Dataset metadata and field mapping");
        Ok(Self {
            dir,
            fields,
            metadata,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn require(&self, kind: &'static str, file: &str) -> Result<PathBuf, SourceError> {
        let path = self.dir.join(file);
        if path.is_file() {
            Ok(path)
        } else {
            Err(SourceError::MissingFile { kind, path })
        }
    }

    fn qrels_file(&self) -> Result<(PathBuf, QrelsFormat), SourceError> {
        let jsonl = self.dir.join(QRELS_JSONL_FILE);
        if jsonl.is_file() {
            return Ok((jsonl, QrelsFormat::Jsonl));
        }
        let trec = self.dir.join(QRELS_TREC_FILE);
        if trec.is_file() {
            return Ok((trec, QrelsFormat::Trec));
        }
        Err(SourceError::MissingFile {
            kind: "qrels",
            path: jsonl,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum QrelsFormat {
    Jsonl,
    Trec,
}

impl DatasetSource for LocalDataset {
    fn docs_count(&self) -> Result<usize, SourceError> {
        match &self.metadata.docs {
            Some(c) => Ok(c.count),
            None => count_records(&self.require("documents", DOCS_FILE)?),
        }
    }

    fn docs_iter(&self) -> Result<RecordIter<'_, Document>, SourceError> {
        let path = self.require("documents", DOCS_FILE)?;
        let fields = &self.fields;
        Ok(Box::new(records(&path)?.map(move |rec| {
            let rec = rec?;
            Ok(Document {
                id: rec.required("doc_id")?,
                title: rec.optional(&fields.document_title)?,
                text: rec.required(&fields.document_text)?,
            })
        })))
    }

    fn queries_count(&self) -> Result<usize, SourceError> {
        match &self.metadata.queries {
            Some(c) => Ok(c.count),
            None => count_records(&self.require("queries", QUERIES_FILE)?),
        }
    }

    fn queries_iter(&self) -> Result<RecordIter<'_, Query>, SourceError> {
        let path = self.require("queries", QUERIES_FILE)?;
        let fields = &self.fields;
        Ok(Box::new(records(&path)?.map(move |rec| {
            let rec = rec?;
            Ok(Query {
                id: rec.required("query_id")?,
                text: rec.required(&fields.query_text)?,
                description: rec.optional(&fields.query_description)?,
            })
        })))
    }

    fn qrels_count(&self) -> Result<usize, SourceError> {
        match &self.metadata.qrels {
            Some(c) => Ok(c.count),
            None => count_records(&self.qrels_file()?.0),
        }
    }

    fn qrels_iter(&self) -> Result<RecordIter<'_, QRel>, SourceError> {
        let (path, format) = self.qrels_file()?;
        match format {
            QrelsFormat::Jsonl => Ok(Box::new(records(&path)?.map(|rec| {
                let rec = rec?;
                Ok(QRel {
                    query_id: rec.required("query_id")?,
                    document_id: rec.required("doc_id")?,
                    relevance: rec.integer("relevance")?,
                })
            }))),
            QrelsFormat::Trec => Ok(Box::new(
                lines(&path)?.map(move |line| parse_trec_qrel(line?)),
            )),
        }
    }
}

/// A non-blank line of a record file, with its 1-based line number.
struct Line {
    path: PathBuf,
    number: usize,
    text: String,
}

fn open_file(path: &Path) -> Result<BufReader<File>, SourceError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn lines(path: &Path) -> Result<impl Iterator<Item = Result<Line, SourceError>> + Send, SourceError> {
    let reader = open_file(path)?;
    let path = path.to_path_buf();
    Ok(reader
        .lines()
        .enumerate()
        .filter_map(move |(i, line)| match line {
            Ok(text) if text.trim().is_empty() => None,
            Ok(text) => Some(Ok(Line {
                path: path.clone(),
                number: i + 1,
                text,
            })),
            Err(source) => Some(Err(SourceError::Io {
                path: path.clone(),
                source,
            })),
        }))
}

fn count_records(path: &Path) -> Result<usize, SourceError> {
    let mut n = 0;
    for line in lines(path)? {
        line?;
        n += 1;
    }
    debug!(path = %path.display(), count = n, "Counted records");
    Ok(n)
}

/// One parsed JSON object plus its location, for error reporting.
struct Record {
    path: PathBuf,
    line: usize,
    fields: Map<String, Value>,
}

fn records(path: &Path) -> Result<impl Iterator<Item = Result<Record, SourceError>> + Send, SourceError> {
    Ok(lines(path)?.map(|line| {
        let line = line?;
        let fields = serde_json::from_str::<Map<String, Value>>(&line.text).map_err(|e| {
            SourceError::Malformed {
                path: line.path.clone(),
                line: line.number,
                reason: e.to_string(),
            }
        })?;
        Ok(Record {
            path: line.path,
            line: line.number,
            fields,
        })
    }))
}

impl Record {
    fn optional(&self, field: &str) -> Result<Option<String>, SourceError> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(SourceError::InvalidField {
                path: self.path.clone(),
                line: self.line,
                field: field.to_string(),
            }),
        }
    }

    fn required(&self, field: &str) -> Result<String, SourceError> {
        self.optional(field)?
            .ok_or_else(|| SourceError::MissingField {
                path: self.path.clone(),
                line: self.line,
                field: field.to_string(),
            })
    }

    fn integer(&self, field: &str) -> Result<i64, SourceError> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Err(SourceError::MissingField {
                path: self.path.clone(),
                line: self.line,
                field: field.to_string(),
            }),
            Some(v) => v.as_i64().ok_or_else(|| SourceError::InvalidField {
                path: self.path.clone(),
                line: self.line,
                field: field.to_string(),
            }),
        }
    }
}

fn parse_trec_qrel(line: Line) -> Result<QRel, SourceError> {
    let malformed = |reason: &str| SourceError::Malformed {
        path: line.path.clone(),
        line: line.number,
        reason: reason.to_string(),
    };
    let cols: Vec<&str> = line.text.split_whitespace().collect();
    let [query_id, _iteration, document_id, relevance] = &cols[..] else {
        return Err(malformed("expected 4 columns: qid iteration docid relevance"));
    };
    let relevance = relevance
        .parse::<i64>()
        .map_err(|_| malformed("relevance is not an integer"))?;
    Ok(QRel {
        query_id: query_id.to_string(),
        document_id: document_id.to_string(),
        relevance,
    })
}
