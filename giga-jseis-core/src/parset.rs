// Copyright (C) 2026 by GiGa infosystems
//! The parset document model behind every XML sidecar of a dataset.
//!
//! A sidecar is a tree of `<parset name="...">` elements whose leaves are
//! `<par name="..." type="...">value</par>` entries. Values are whitespace-padded
//! text; multi-valued pars separate their tokens with whitespace. The documents are
//! written without an XML declaration, which is what the format expects on disk.
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::errors::*;

use std::fs;
use std::path::Path;

/// One `<par>` entry: a named, typed, text-valued leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct Par {
    pub name: String,
    pub ptype: String,
    pub value: String,
}

impl Par {
    pub fn new<N, T, V>(name: N, ptype: T, value: V) -> Self
    where
        N: Into<String>,
        T: Into<String>,
        V: Into<String>,
    {
        Par {
            name: name.into(),
            ptype: ptype.into(),
            value: value.into(),
        }
    }

    /// The value with its whitespace padding removed.
    pub fn text(&self) -> &str {
        self.value.trim()
    }

    /// The value split on whitespace, for multi-valued pars.
    pub fn tokens(&self) -> Vec<&str> {
        self.text().split_whitespace().collect()
    }

    /// The value with padding and one pair of surrounding quotes removed. Free-text
    /// fields such as comments and property descriptions are stored quoted.
    pub fn unquoted(&self) -> &str {
        let t = self.text();
        t.strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(t)
    }
}

/// One `<parset>` element: named, holding pars and child parsets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parset {
    pub name: String,
    pub pars: Vec<Par>,
    pub children: Vec<Parset>,
}

impl Parset {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Parset {
            name: name.into(),
            pars: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn par(&self, name: &str) -> Option<&Par> {
        self.pars.iter().find(|p| p.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&Parset> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn require_par(&self, name: &str) -> Result<&Par, JsError> {
        self.par(name).ok_or_else(|| JsError::MalformedMetadata {
            msg: format!("parset '{}' has no par '{}'", self.name, name),
        })
    }

    pub fn require_child(&self, name: &str) -> Result<&Parset, JsError> {
        self.child(name).ok_or_else(|| JsError::MalformedMetadata {
            msg: format!("parset '{}' has no child parset '{}'", self.name, name),
        })
    }

    pub fn add_par<N, T, V>(&mut self, name: N, ptype: T, value: V)
    where
        N: Into<String>,
        T: Into<String>,
        V: Into<String>,
    {
        self.pars.push(Par::new(name, ptype, value));
    }

    pub fn add_child(&mut self, child: Parset) {
        self.children.push(child);
    }

    pub fn par_string(&self, name: &str) -> Result<String, JsError> {
        Ok(self.require_par(name)?.text().to_string())
    }

    pub fn par_strings(&self, name: &str) -> Result<Vec<String>, JsError> {
        Ok(self
            .require_par(name)?
            .tokens()
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    pub fn par_i64(&self, name: &str) -> Result<i64, JsError> {
        parse_token(self.name.as_str(), self.require_par(name)?)
    }

    pub fn par_usize(&self, name: &str) -> Result<usize, JsError> {
        parse_token(self.name.as_str(), self.require_par(name)?)
    }

    pub fn par_f64(&self, name: &str) -> Result<f64, JsError> {
        parse_token(self.name.as_str(), self.require_par(name)?)
    }

    pub fn par_bool(&self, name: &str) -> Result<bool, JsError> {
        parse_token(self.name.as_str(), self.require_par(name)?)
    }

    pub fn par_i64s(&self, name: &str) -> Result<Vec<i64>, JsError> {
        parse_tokens(self.name.as_str(), self.require_par(name)?)
    }

    pub fn par_usizes(&self, name: &str) -> Result<Vec<usize>, JsError> {
        parse_tokens(self.name.as_str(), self.require_par(name)?)
    }

    pub fn par_f64s(&self, name: &str) -> Result<Vec<f64>, JsError> {
        parse_tokens(self.name.as_str(), self.require_par(name)?)
    }

    /// Parse a parset document from XML text. The document must hold exactly one
    /// top-level parset.
    /// ```
    /// # use giga_jseis_core::parset::Parset;
    /// let doc = "<parset name=\"A\">\n  <par name=\"N\" type=\"int\"> 3 </par>\n</parset>";
    /// let ps = Parset::from_xml(doc).unwrap();
    /// assert_eq!(ps.name, "A");
    /// assert_eq!(ps.par_i64("N").unwrap(), 3);
    /// ```
    pub fn from_xml(text: &str) -> Result<Parset, JsError> {
        let mut reader = Reader::from_str(text);
        // Parsets being built, innermost last.
        let mut stack: Vec<Parset> = Vec::new();
        let mut root: Option<Parset> = None;
        // The par currently being read, if any.
        let mut par: Option<Par> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => match e.name().as_ref() {
                    b"parset" => stack.push(Parset::new(name_attr(&e)?)),
                    b"par" => {
                        par = Some(Par::new(name_attr(&e)?, type_attr(&e)?, String::new()));
                    }
                    other => {
                        return Err(JsError::MalformedMetadata {
                            msg: format!(
                                "unexpected element '{}' in parset document",
                                String::from_utf8_lossy(other)
                            ),
                        })
                    }
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"parset" => attach(&mut stack, &mut root, Parset::new(name_attr(&e)?))?,
                    b"par" => {
                        let p = Par::new(name_attr(&e)?, type_attr(&e)?, String::new());
                        match stack.last_mut() {
                            Some(ps) => ps.pars.push(p),
                            None => {
                                return Err(JsError::MalformedMetadata {
                                    msg: "par outside of any parset".to_string(),
                                })
                            }
                        }
                    }
                    _ => {}
                },
                Event::Text(t) => {
                    if let Some(p) = par.as_mut() {
                        p.value.push_str(&t.unescape()?);
                    }
                }
                Event::End(e) => match e.name().as_ref() {
                    b"par" => {
                        let p = par.take().ok_or_else(|| JsError::MalformedMetadata {
                            msg: "stray </par>".to_string(),
                        })?;
                        match stack.last_mut() {
                            Some(ps) => ps.pars.push(p),
                            None => {
                                return Err(JsError::MalformedMetadata {
                                    msg: "par outside of any parset".to_string(),
                                })
                            }
                        }
                    }
                    b"parset" => {
                        let done = stack.pop().ok_or_else(|| JsError::MalformedMetadata {
                            msg: "stray </parset>".to_string(),
                        })?;
                        attach(&mut stack, &mut root, done)?;
                    }
                    _ => {}
                },
                Event::Eof => break,
                // Declarations, comments and processing instructions are tolerated.
                _ => {}
            }
        }

        root.ok_or_else(|| JsError::MalformedMetadata {
            msg: "document holds no parset".to_string(),
        })
    }

    /// Render the parset tree as XML text, without an XML declaration.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.render(&mut out, 0);
        out
    }

    fn render(&self, out: &mut String, depth: usize) {
        let pad = "  ".repeat(depth);
        out.push_str(&format!("{}<parset name=\"{}\">\n", pad, escape(&self.name)));
        for p in &self.pars {
            out.push_str(&format!(
                "{}  <par name=\"{}\" type=\"{}\"> {} </par>\n",
                pad,
                escape(&p.name),
                escape(&p.ptype),
                partial_escape(p.text())
            ));
        }
        for c in &self.children {
            c.render(out, depth + 1);
        }
        out.push_str(&format!("{}</parset>\n", pad));
    }

    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Parset, JsError> {
        let text = fs::read_to_string(path)?;
        Self::from_xml(&text)
    }

    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<(), JsError> {
        fs::write(path, self.to_xml())?;
        Ok(())
    }
}

fn attach(
    stack: &mut Vec<Parset>,
    root: &mut Option<Parset>,
    done: Parset,
) -> Result<(), JsError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(done),
        None if root.is_none() => *root = Some(done),
        None => {
            return Err(JsError::MalformedMetadata {
                msg: "more than one top-level parset".to_string(),
            })
        }
    }
    Ok(())
}

fn attr(e: &BytesStart, key: &[u8]) -> Result<Option<String>, JsError> {
    for a in e.attributes() {
        let a = a.map_err(|err| JsError::MalformedMetadata {
            msg: format!("bad attribute: {}", err),
        })?;
        if a.key.as_ref() == key {
            return Ok(Some(a.unescape_value()?.to_string()));
        }
    }
    Ok(None)
}

fn name_attr(e: &BytesStart) -> Result<String, JsError> {
    attr(e, b"name")?.ok_or_else(|| JsError::MalformedMetadata {
        msg: "element without a name attribute".to_string(),
    })
}

fn type_attr(e: &BytesStart) -> Result<String, JsError> {
    attr(e, b"type")?.ok_or_else(|| JsError::MalformedMetadata {
        msg: "par without a type attribute".to_string(),
    })
}

fn parse_token<T: std::str::FromStr>(parset: &str, par: &Par) -> Result<T, JsError> {
    par.text().parse().map_err(|_| JsError::MalformedMetadata {
        msg: format!("par '{}' of '{}' holds '{}'", par.name, parset, par.text()),
    })
}

fn parse_tokens<T: std::str::FromStr>(parset: &str, par: &Par) -> Result<Vec<T>, JsError> {
    par.tokens()
        .iter()
        .map(|t| {
            t.parse().map_err(|_| JsError::MalformedMetadata {
                msg: format!("par '{}' of '{}' holds '{}'", par.name, parset, t),
            })
        })
        .collect()
}
