//! Sweep summaries printed by the inspector.

use chrono::{DateTime, Utc};
use radar_view::RadarProductView;
use serde::Serialize;
use std::fmt;

/// Metadata of one computed sweep plus what its manager holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepReport {
    pub site: String,
    pub product: String,
    pub product_name: String,
    pub time: Option<DateTime<Utc>>,
    pub elevation: f32,
    pub vcp: Option<u16>,
    pub range_km: f32,
    pub gates: usize,
    pub vertices: usize,
    pub elevations: Vec<f32>,
    pub volumes: Vec<DateTime<Utc>>,
    pub level3_products: Vec<i16>,
}

impl SweepReport {
    /// Snapshot the view's published sweep.
    pub async fn collect(view: &RadarProductView) -> Self {
        let sweep = view.sweep();
        let manager = view.manager();
        let selection = view.selection().await;

        Self {
            site: manager.radar_site().id.clone(),
            product: selection.product.short_name(),
            product_name: view.product_name().await,
            time: sweep.metadata.time,
            elevation: sweep.metadata.elevation,
            vcp: sweep.metadata.vcp,
            range_km: sweep.metadata.range / 1000.0,
            gates: sweep.gate_count(),
            vertices: sweep.vertex_count(),
            elevations: view.elevation_angles().await,
            volumes: manager.volume_times().await,
            level3_products: manager.level3_products().await,
        }
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Site:       {}", self.site)?;
        writeln!(f, "Product:    {} ({})", self.product, self.product_name)?;
        match self.time {
            Some(time) => writeln!(f, "Time:       {}", time.format("%Y-%m-%d %H:%M:%S UTC"))?,
            None => writeln!(f, "Time:       no data")?,
        }
        writeln!(f, "Elevation:  {:.1}°", self.elevation)?;
        if let Some(vcp) = self.vcp {
            writeln!(f, "VCP:        {}", vcp)?;
        }
        writeln!(f, "Range:      {:.1} km", self.range_km)?;
        writeln!(f, "Gates:      {} ({} vertices)", self.gates, self.vertices)?;

        if !self.elevations.is_empty() {
            let angles: Vec<String> = self.elevations.iter().map(|e| format!("{:.1}", e)).collect();
            writeln!(f, "Elevations: {}", angles.join(", "))?;
        }
        if !self.volumes.is_empty() {
            writeln!(f, "Volumes:    {}", self.volumes.len())?;
        }
        if !self.level3_products.is_empty() {
            let codes: Vec<String> = self.level3_products.iter().map(i16::to_string).collect();
            writeln!(f, "Level III:  {}", codes.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::volume_time;

    fn report() -> SweepReport {
        SweepReport {
            site: "KTLX".to_string(),
            product: "REF".to_string(),
            product_name: "Reflectivity".to_string(),
            time: Some(volume_time()),
            elevation: 0.5,
            vcp: Some(212),
            range_km: 4.5,
            gates: 3600,
            vertices: 21600,
            elevations: vec![0.5, 1.5, 2.4],
            volumes: vec![volume_time()],
            level3_products: Vec::new(),
        }
    }

    #[test]
    fn test_text_report() {
        let text = report().to_string();
        assert!(text.contains("Site:       KTLX"));
        assert!(text.contains("Elevation:  0.5°"));
        assert!(text.contains("VCP:        212"));
        assert!(text.contains("Elevations: 0.5, 1.5, 2.4"));
        assert!(!text.contains("Level III"));
    }

    #[test]
    fn test_text_report_without_data() {
        let empty = SweepReport {
            time: None,
            vcp: None,
            gates: 0,
            vertices: 0,
            ..report()
        };
        let text = empty.to_string();
        assert!(text.contains("no data"));
        assert!(!text.contains("VCP"));
    }

    #[test]
    fn test_json_report() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["site"], "KTLX");
        assert_eq!(json["gates"], 3600);
        assert_eq!(json["vcp"], 212);
        assert_eq!(json["elevations"].as_array().unwrap().len(), 3);
    }
}
