// Copyright (C) 2026 by GiGa infosystems
//! This submodule turns the sidecar files of a dataset into the core metadata model.
//!
//! Everything here is pure translation: the parset documents are read by
//! `giga_jseis_core::parset` and picked apart into [`JsMetadata`], the extent
//! manager descriptions and the two plain-text property files.
use giga_jseis_core::errors::*;
use giga_jseis_core::parset::Parset;
use giga_jseis_core::properties::{HeaderLayout, PropertyDef, TraceProperty};
use giga_jseis_core::settings::JsSettings;
use giga_jseis_core::{
    Axis, ByteOrder, DataProperty, Geometry, JsMetadata, PropertyFormat, TraceFormat,
    FILE_PROPERTIES_XML, NAME_PROPERTIES, STATUS_PROPERTIES, VIRTUAL_FOLDERS_XML,
};

use std::fs;
use std::path::{Path, PathBuf};

/// The VFIO description of one extent set, from `TraceFile.xml` or
/// `TraceHeaders.xml`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtentInfo {
    pub base_name: String,
    /// Uniform capacity of every extent but the last.
    pub extent_size: u64,
    /// Number of extent files.
    pub max_file: usize,
    /// Last valid byte offset of the stream.
    pub max_pos: u64,
}

/// Read and validate the extent manager sidecar of one stream.
pub fn read_extent_info(primary: &Path, file_name: &str) -> Result<ExtentInfo, JsError> {
    let ps = Parset::read_file(primary.join(file_name))?;
    if ps.name != "ExtentManager" {
        return Err(JsError::MalformedMetadata {
            msg: format!("'{}' is not an ExtentManager parset", file_name),
        });
    }
    let info = ExtentInfo {
        base_name: ps.par_string("VFIO_EXTNAME")?,
        extent_size: ps.par_i64("VFIO_EXTSIZE")? as u64,
        max_file: ps.par_usize("VFIO_MAXFILE")?,
        max_pos: ps.par_i64("VFIO_MAXPOS")? as u64,
    };
    if info.extent_size == 0 || info.max_file == 0 {
        return Err(JsError::MalformedMetadata {
            msg: format!("'{}' declares an empty extent set", file_name),
        });
    }
    Ok(info)
}

/// Read the secondary storage roots from `VirtualFolders.xml`.
pub fn read_secondaries(primary: &Path) -> Result<Vec<PathBuf>, JsError> {
    let ps = Parset::read_file(primary.join(VIRTUAL_FOLDERS_XML))?;
    let ndir = ps.par_usize("NDIR")?;
    let mut secondaries = Vec::with_capacity(ndir);
    for k in 0..ndir {
        let par = ps.require_par(&format!("FILESYSTEM-{}", k))?;
        // Entries read `<path>,READ_WRITE`; only the path part matters here.
        let path = par.text().split(',').next().unwrap_or("").trim();
        if path.is_empty() {
            return Err(JsError::MalformedMetadata {
                msg: format!("FILESYSTEM-{} declares no path", k),
            });
        }
        secondaries.push(PathBuf::from(path));
    }
    Ok(secondaries)
}

/// Read the descriptive name from `Name.properties`.
pub fn read_name_properties(primary: &Path) -> Result<String, JsError> {
    let text = fs::read_to_string(primary.join(NAME_PROPERTIES))?;
    for line in text.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        if let Some(value) = line.strip_prefix("DescriptiveName=") {
            return Ok(value.trim().to_string());
        }
    }
    Err(JsError::MalformedMetadata {
        msg: "Name.properties has no DescriptiveName".to_string(),
    })
}

/// Read the has-traces flag from `Status.properties`.
///
/// A missing file is not an error: legacy datasets predate the status sidecar and
/// read as `false`.
pub fn read_status_properties(primary: &Path) -> Result<bool, JsError> {
    let text = match fs::read_to_string(primary.join(STATUS_PROPERTIES)) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    for line in text.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        if let Some(value) = line.strip_prefix("HasTraces=") {
            return Ok(value.trim() == "true");
        }
    }
    Ok(false)
}

/// Parse `FileProperties.xml` and the two plain-text sidecars into the metadata
/// model, validating the invariants as declared.
pub fn read_metadata(primary: &Path, settings: &JsSettings) -> Result<JsMetadata, JsError> {
    let root = Parset::read_file(primary.join(FILE_PROPERTIES_XML))?;
    let fp = root.require_child("FileProperties")?;

    let ndim = fp.par_usize("DataDimensions")?;
    let axes = parse_axes(fp, ndim)?;
    let layout = parse_trace_properties(root.require_child("TraceProperties")?)?;
    if layout.record_length() != fp.par_usize("HeaderLengthBytes")? {
        return Err(JsError::MalformedMetadata {
            msg: format!(
                "HeaderLengthBytes declares {} but the properties cover {}",
                fp.par_usize("HeaderLengthBytes")?,
                layout.record_length()
            ),
        });
    }

    let (data_properties, geometry) = match root.child("CustomProperties") {
        Some(cp) => (parse_data_properties(cp), parse_geometry(cp)?),
        None => (Vec::new(), None),
    };

    let metadata = JsMetadata {
        descriptive_name: read_name_properties(primary)?,
        comments: fp.require_par("Comments")?.unquoted().to_string(),
        version: fp.par_string("JavaSeisVersion")?,
        data_type: fp.par_string("DataType")?,
        trace_format: TraceFormat::new(&fp.par_string("TraceFormat")?)?,
        byte_order: ByteOrder::new(&fp.par_string("ByteOrder")?)?,
        mapped: fp.par_bool("Mapped")?,
        axes,
        layout,
        data_properties,
        geometry,
        secondaries: read_secondaries(primary)?,
        has_traces: read_status_properties(primary)?,
    };
    metadata.validate(settings.get_dictionary())?;
    Ok(metadata)
}

fn parse_axes(fp: &Parset, ndim: usize) -> Result<Vec<Axis>, JsError> {
    let labels = fp.par_strings("AxisLabels")?;
    let units = fp.par_strings("AxisUnits")?;
    let domains = fp.par_strings("AxisDomains")?;
    let lengths = fp.par_usizes("AxisLengths")?;
    let logical_origins = fp.par_i64s("LogicalOrigins")?;
    let logical_deltas = fp.par_i64s("LogicalDeltas")?;
    let physical_origins = fp.par_f64s("PhysicalOrigins")?;
    let physical_deltas = fp.par_f64s("PhysicalDeltas")?;

    for (name, len) in [
        ("AxisLabels", labels.len()),
        ("AxisUnits", units.len()),
        ("AxisDomains", domains.len()),
        ("AxisLengths", lengths.len()),
        ("LogicalOrigins", logical_origins.len()),
        ("LogicalDeltas", logical_deltas.len()),
        ("PhysicalOrigins", physical_origins.len()),
        ("PhysicalDeltas", physical_deltas.len()),
    ] {
        if len != ndim {
            return Err(JsError::MalformedMetadata {
                msg: format!("{} has {} entries for {} dimensions", name, len, ndim),
            });
        }
    }

    let axes = (0..ndim)
        .map(|i| Axis {
            label: labels[i].clone(),
            units: units[i].clone(),
            domain: domains[i].clone(),
            length: lengths[i],
            logical_origin: logical_origins[i],
            logical_delta: logical_deltas[i],
            physical_origin: physical_origins[i],
            physical_delta: physical_deltas[i],
        })
        .collect();
    Ok(axes)
}

fn parse_trace_properties(tp: &Parset) -> Result<HeaderLayout, JsError> {
    let mut entries = Vec::with_capacity(tp.children.len());
    for entry in &tp.children {
        let def = PropertyDef {
            label: entry.par_string("label")?,
            description: entry.require_par("description")?.unquoted().to_string(),
            format: PropertyFormat::new(&entry.par_string("format")?)?,
            count: entry.par_usize("elementCount")?,
        };
        entries.push(TraceProperty {
            def,
            byte_offset: entry.par_usize("byteOffset")?,
        });
    }
    HeaderLayout::from_entries(entries)
}

fn parse_data_properties(cp: &Parset) -> Vec<DataProperty> {
    cp.pars
        .iter()
        .map(|p| DataProperty::new(p.name.clone(), p.ptype.clone(), p.text().to_string()))
        .collect()
}

/// The geometry is read from the `Geometry` subparset as labelled, when present.
fn parse_geometry(cp: &Parset) -> Result<Option<Geometry>, JsError> {
    let g = match cp.child("Geometry") {
        Some(g) => g,
        None => return Ok(None),
    };
    Ok(Some(Geometry {
        min_i_line: g.par_i64("minILine")? as i32,
        max_i_line: g.par_i64("maxILine")? as i32,
        min_x_line: g.par_i64("minXLine")? as i32,
        max_x_line: g.par_i64("maxXLine")? as i32,
        x_i_line1_start: g.par_f64("xILine1Start")?,
        y_i_line1_start: g.par_f64("yILine1Start")?,
        x_i_line1_end: g.par_f64("xILine1End")?,
        y_i_line1_end: g.par_f64("yILine1End")?,
        x_x_line1_end: g.par_f64("xXLine1End")?,
        y_x_line1_end: g.par_f64("yXLine1End")?,
    }))
}
