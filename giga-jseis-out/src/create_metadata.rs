// Copyright (C) 2026 by GiGa infosystems
//! This submodule builds the metadata of a new dataset from [`CreateOptions`] and
//! emits the sidecar files.
//!
//! The header schema of a fresh dataset is constructed in the canonical order
//! [stock set, user-defined, per-axis] with duplicate labels suppressed; a
//! *similar-to* creation starts from the source's property list instead and applies
//! the narrow add/rm edits on top.
use giga_jseis_core::errors::*;
use giga_jseis_core::parset::Parset;
use giga_jseis_core::properties::{known_property, stock_properties, HeaderLayout, PropertyDef};
use giga_jseis_core::settings::JsSettings;
use giga_jseis_core::{
    Axis, ByteOrder, DataProperty, Geometry, JsMetadata, PropertyFormat, TraceFormat,
    DEFAULT_AXIS_LABELS, JS_VERSION, MAX_DIMENSIONS, MIN_DIMENSIONS, NAME_PROPERTIES,
    STATUS_PROPERTIES, UNKNOWN, VFIO_VERSION,
};

use std::fs;
use std::path::Path;

use crate::settings::CreateOptions;

/// Build and validate the full metadata of the dataset described by `options`.
pub(crate) fn metadata_from_options(
    primary: &Path,
    options: &CreateOptions,
    settings: &JsSettings,
) -> Result<JsMetadata, JsError> {
    let ndim = options.axis_lengths.len();
    if ndim < MIN_DIMENSIONS || ndim > MAX_DIMENSIONS {
        return Err(JsError::PreconditionViolated {
            msg: format!(
                "axis lengths must hold {}..={} entries, got {}",
                MIN_DIMENSIONS, MAX_DIMENSIONS, ndim
            ),
        });
    }

    let axes = build_axes(options, ndim)?;
    let layout = build_layout(options, &axes, settings)?;
    let data_properties = build_data_properties(options)?;

    let descriptive_name = match &options.descriptive_name {
        Some(n) => n.clone(),
        None => primary
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
    };

    let metadata = JsMetadata {
        descriptive_name,
        comments: options
            .comments
            .clone()
            .unwrap_or_else(|| "Written by giga-jseis".to_string()),
        version: JS_VERSION.to_string(),
        data_type: options.data_type.clone().unwrap_or_else(|| "CUSTOM".to_string()),
        trace_format: options.trace_format.unwrap_or(TraceFormat::Float32),
        byte_order: options.byte_order.unwrap_or(ByteOrder::LittleEndian),
        mapped: options.mapped.unwrap_or(true),
        axes,
        layout,
        data_properties,
        geometry: options.geometry.clone(),
        secondaries: options
            .secondaries
            .clone()
            .unwrap_or_else(|| vec![Path::new(".").to_path_buf()]),
        has_traces: false,
    };
    metadata.validate(settings.get_dictionary())?;
    Ok(metadata)
}

fn axis_vec<T: Clone>(
    given: &Option<Vec<T>>,
    ndim: usize,
    name: &str,
    default: impl Fn(usize) -> T,
) -> Result<Vec<T>, JsError> {
    match given {
        Some(v) if v.len() == ndim => Ok(v.clone()),
        Some(v) => Err(JsError::PreconditionViolated {
            msg: format!("{} holds {} entries for {} dimensions", name, v.len(), ndim),
        }),
        None => Ok((0..ndim).map(default).collect()),
    }
}

fn build_axes(options: &CreateOptions, ndim: usize) -> Result<Vec<Axis>, JsError> {
    let labels = axis_vec(&options.axis_labels, ndim, "axis labels", |i| {
        DEFAULT_AXIS_LABELS[i].to_string()
    })?;
    let units = axis_vec(&options.axis_units, ndim, "axis units", |_| {
        UNKNOWN.to_string()
    })?;
    let domains = axis_vec(&options.axis_domains, ndim, "axis domains", |_| {
        UNKNOWN.to_string()
    })?;
    let logical_origins = axis_vec(&options.logical_origins, ndim, "logical origins", |_| 1)?;
    let logical_deltas = axis_vec(&options.logical_deltas, ndim, "logical deltas", |_| 1)?;
    let physical_origins =
        axis_vec(&options.physical_origins, ndim, "physical origins", |_| 0.0)?;
    let physical_deltas = axis_vec(&options.physical_deltas, ndim, "physical deltas", |_| 1.0)?;

    let axes: Vec<Axis> = (0..ndim)
        .map(|i| Axis {
            label: labels[i].clone(),
            units: units[i].clone(),
            domain: domains[i].clone(),
            length: options.axis_lengths[i],
            logical_origin: logical_origins[i],
            logical_delta: logical_deltas[i],
            physical_origin: physical_origins[i],
            physical_delta: physical_deltas[i],
        })
        .collect();
    for (i, axis) in axes.iter().enumerate() {
        axis.validate(i)?;
    }
    Ok(axes)
}

fn build_layout(
    options: &CreateOptions,
    axes: &[Axis],
    settings: &JsSettings,
) -> Result<HeaderLayout, JsError> {
    let explicit = options.properties.is_some();
    if explicit && (!options.properties_add.is_empty() || !options.properties_rm.is_empty()) {
        return Err(JsError::PreconditionViolated {
            msg: "property add/rm edits cannot coexist with an explicit property set"
                .to_string(),
        });
    }

    let mut defs: Vec<PropertyDef> = match (&options.inherited, explicit) {
        (Some(inherited), false) => inherited.properties.clone(),
        _ => stock_properties(),
    };

    // Removal by label is an exact set difference; asking to remove something
    // that is not there is a caller mistake, not a no-op.
    for label in &options.properties_rm {
        match defs.iter().position(|d| &d.label == label) {
            Some(i) => {
                defs.remove(i);
            }
            None => {
                return Err(JsError::PropertyNotFound {
                    label: label.clone(),
                })
            }
        }
    }

    match &options.properties {
        Some(user) => defs.extend(user.iter().cloned()),
        None => defs.extend(options.properties_add.iter().cloned()),
    }

    let dictionary = settings.get_dictionary();
    for axis in axes {
        let label = dictionary.property_for(&axis.label);
        let def = known_property(label)
            .unwrap_or_else(|| PropertyDef::scalar(label, "Axis bin index", PropertyFormat::Int32));
        defs.push(def);
    }

    Ok(HeaderLayout::assemble(defs))
}

fn build_data_properties(options: &CreateOptions) -> Result<Vec<DataProperty>, JsError> {
    let explicit = options.data_properties.is_some();
    if explicit
        && (!options.data_properties_add.is_empty() || !options.data_properties_rm.is_empty())
    {
        return Err(JsError::PreconditionViolated {
            msg: "data property add/rm edits cannot coexist with an explicit set".to_string(),
        });
    }

    let mut props = match (&options.data_properties, &options.inherited) {
        (Some(explicit), _) => explicit.clone(),
        (None, Some(inherited)) => inherited.data_properties.clone(),
        (None, None) => Vec::new(),
    };

    for label in &options.data_properties_rm {
        match props.iter().position(|p| &p.label == label) {
            Some(i) => {
                props.remove(i);
            }
            None => {
                return Err(JsError::DataPropertyNotFound {
                    label: label.clone(),
                })
            }
        }
    }

    for add in &options.data_properties_add {
        match props.iter_mut().find(|p| p.label == add.label) {
            Some(existing) => *existing = add.clone(),
            None => props.push(add.clone()),
        }
    }
    Ok(props)
}

/// Render `FileProperties.xml` for a metadata instance.
pub(crate) fn file_properties_parset(meta: &JsMetadata) -> Parset {
    let mut fp = Parset::new("FileProperties");
    fp.add_par("Comments", "string", format!("\"{}\"", meta.comments));
    fp.add_par("JavaSeisVersion", "string", meta.version.clone());
    fp.add_par("DataType", "string", meta.data_type.clone());
    fp.add_par("TraceFormat", "string", meta.trace_format.disk_name());
    fp.add_par("ByteOrder", "string", meta.byte_order.disk_name());
    fp.add_par("Mapped", "boolean", bool_str(meta.mapped));
    fp.add_par("DataDimensions", "int", meta.ndim().to_string());
    fp.add_par("AxisLabels", "string", join(meta.axes.iter().map(|a| a.label.clone())));
    fp.add_par("AxisUnits", "string", join(meta.axes.iter().map(|a| a.units.clone())));
    fp.add_par("AxisDomains", "string", join(meta.axes.iter().map(|a| a.domain.clone())));
    fp.add_par("AxisLengths", "long", join(meta.axes.iter().map(|a| a.length.to_string())));
    fp.add_par(
        "LogicalOrigins",
        "long",
        join(meta.axes.iter().map(|a| a.logical_origin.to_string())),
    );
    fp.add_par(
        "LogicalDeltas",
        "long",
        join(meta.axes.iter().map(|a| a.logical_delta.to_string())),
    );
    fp.add_par(
        "PhysicalOrigins",
        "double",
        join(meta.axes.iter().map(|a| float_str(a.physical_origin))),
    );
    fp.add_par(
        "PhysicalDeltas",
        "double",
        join(meta.axes.iter().map(|a| float_str(a.physical_delta))),
    );
    fp.add_par(
        "HeaderLengthBytes",
        "int",
        meta.header_record_length().to_string(),
    );

    let mut tp = Parset::new("TraceProperties");
    for (i, p) in meta.layout.props().iter().enumerate() {
        let mut entry = Parset::new(format!("entry_{}", i + 1));
        entry.add_par("label", "string", p.def.label.clone());
        entry.add_par("description", "string", format!("\"{}\"", p.def.description));
        entry.add_par("format", "string", p.def.format.disk_name());
        entry.add_par("elementCount", "int", p.def.count.to_string());
        entry.add_par("byteOffset", "int", p.byte_offset.to_string());
        tp.add_child(entry);
    }

    let mut cp = Parset::new("CustomProperties");
    for dp in &meta.data_properties {
        cp.add_par(dp.label.clone(), dp.format.clone(), dp.value.clone());
    }
    if let Some(g) = &meta.geometry {
        cp.add_child(geometry_parset(g));
    }

    let mut root = Parset::new("JavaSeis Metadata");
    root.add_child(fp);
    root.add_child(tp);
    root.add_child(cp);
    root
}

fn geometry_parset(g: &Geometry) -> Parset {
    let mut ps = Parset::new("Geometry");
    ps.add_par("minILine", "int", g.min_i_line.to_string());
    ps.add_par("maxILine", "int", g.max_i_line.to_string());
    ps.add_par("minXLine", "int", g.min_x_line.to_string());
    ps.add_par("maxXLine", "int", g.max_x_line.to_string());
    ps.add_par("xILine1Start", "double", float_str(g.x_i_line1_start));
    ps.add_par("yILine1Start", "double", float_str(g.y_i_line1_start));
    ps.add_par("xILine1End", "double", float_str(g.x_i_line1_end));
    ps.add_par("yILine1End", "double", float_str(g.y_i_line1_end));
    ps.add_par("xXLine1End", "double", float_str(g.x_x_line1_end));
    ps.add_par("yXLine1End", "double", float_str(g.y_x_line1_end));
    ps
}

/// Render the extent manager sidecar of one stream.
pub(crate) fn extent_manager_parset(
    base_name: &str,
    extent_size: u64,
    max_file: usize,
    max_pos: u64,
) -> Parset {
    let mut ps = Parset::new("ExtentManager");
    ps.add_par("VFIO_VERSION", "string", VFIO_VERSION);
    ps.add_par("VFIO_EXTSIZE", "long", extent_size.to_string());
    ps.add_par("VFIO_MAXFILE", "int", max_file.to_string());
    ps.add_par("VFIO_MAXPOS", "long", max_pos.to_string());
    ps.add_par("VFIO_EXTNAME", "string", base_name);
    ps.add_par("VFIO_POLICY", "string", "RANDOM");
    ps
}

/// Render `VirtualFolders.xml`.
pub(crate) fn virtual_folders_parset(meta: &JsMetadata) -> Parset {
    let mut ps = Parset::new("VirtualFolders");
    ps.add_par("NDIR", "int", meta.secondaries.len().to_string());
    for (k, s) in meta.secondaries.iter().enumerate() {
        ps.add_par(
            format!("FILESYSTEM-{}", k),
            "string",
            format!("{},READ_WRITE", s.display()),
        );
    }
    ps.add_par("Version", "string", VFIO_VERSION);
    ps.add_par(
        "Header",
        "string",
        format!("\"VFIO org.javaseis.io.VirtualFolders {}\"", VFIO_VERSION),
    );
    ps.add_par("Type", "string", "SS");
    ps.add_par("POLICY_ID", "string", "RANDOM");
    ps.add_par("GLOBAL_REQUIRED_FREE_SPACE", "long", "0");
    ps
}

pub(crate) fn write_name_properties(primary: &Path, name: &str) -> Result<(), JsError> {
    let text = format!("#JavaSeis dataset properties\nDescriptiveName={}\n", name);
    fs::write(primary.join(NAME_PROPERTIES), text)?;
    Ok(())
}

pub(crate) fn write_status_properties(primary: &Path, has_traces: bool) -> Result<(), JsError> {
    let text = format!("#JavaSeis dataset status\nHasTraces={}\n", bool_str(has_traces));
    fs::write(primary.join(STATUS_PROPERTIES), text)?;
    Ok(())
}

fn bool_str(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

fn float_str(v: f64) -> String {
    format!("{:?}", v)
}

fn join<I: Iterator<Item = String>>(items: I) -> String {
    items.collect::<Vec<_>>().join(" ")
}
