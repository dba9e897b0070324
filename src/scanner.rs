// Trivy image vulnerability scanning. The scanner binary is an external
// tool; a missing binary is an answerable condition, not a server fault.

use serde::Serialize;
use std::time::Duration;
use tokio::process::Command;
use tracing::instrument;

const TRIVY_SEVERITIES: &str = "HIGH,CRITICAL";

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSummary {
    pub total: u32,
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Vulnerability {
    pub id: String,
    pub title: String,
    pub severity: String,
    pub package_name: String,
    pub installed_version: String,
    pub fixed_version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScannedComponent {
    pub target: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub class: String,
    pub vulnerabilities_count: usize,
}

/// Outcome of one scan. `status` is success, error, or warning (trivy not
/// installed); error details ride in `message`.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub image: String,
    pub status: String,
    pub scan_tool: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ScanSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vulnerabilities: Vec<Vulnerability>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scanned_components: Vec<ScannedComponent>,
}

impl ScanReport {
    fn failed(image: &str, status: &str, message: impl Into<String>) -> Self {
        Self {
            image: image.to_string(),
            status: status.into(),
            scan_tool: "trivy".into(),
            message: Some(message.into()),
            summary: None,
            vulnerabilities: vec![],
            scanned_components: vec![],
        }
    }
}

pub struct TrivyScanner {
    timeout: Duration,
}

impl TrivyScanner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Scan an image by name or id. All failure modes come back as a
    /// report body; the caller only sees Err for internal task faults.
    #[instrument(skip(self), fields(operation = "scan_image"))]
    pub async fn scan_image(&self, image: &str) -> ScanReport {
        let output = Command::new("trivy")
            .args(["image", "--format", "json", "--severity", TRIVY_SEVERITIES])
            .arg(image)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, output).await {
            Ok(Ok(out)) => out,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return ScanReport::failed(
                    image,
                    "warning",
                    "trivy is not installed on the service host",
                );
            }
            Ok(Err(e)) => {
                return ScanReport::failed(image, "error", format!("failed to run trivy: {}", e));
            }
            Err(_) => {
                return ScanReport::failed(
                    image,
                    "error",
                    format!("scan timed out after {}s", self.timeout.as_secs()),
                );
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return ScanReport::failed(image, "error", stderr.trim().to_string());
        }

        match serde_json::from_slice::<serde_json::Value>(&output.stdout) {
            Ok(report) => parse_trivy_report(image, &report),
            Err(e) => ScanReport::failed(image, "error", format!("unparseable trivy output: {}", e)),
        }
    }
}

/// Flatten a raw Trivy report into our summary + vulnerability list.
pub fn parse_trivy_report(image: &str, report: &serde_json::Value) -> ScanReport {
    let mut summary = ScanSummary::default();
    let mut vulnerabilities = Vec::new();
    let mut scanned_components = Vec::new();

    let results = report
        .get("Results")
        .and_then(|r| r.as_array())
        .cloned()
        .unwrap_or_default();

    for result in &results {
        let vulns = result
            .get("Vulnerabilities")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        scanned_components.push(ScannedComponent {
            target: str_field(result, "Target"),
            type_: str_field(result, "Type"),
            class: str_field(result, "Class"),
            vulnerabilities_count: vulns.len(),
        });

        for vuln in &vulns {
            let severity = str_field(vuln, "Severity").to_uppercase();
            summary.total += 1;
            match severity.as_str() {
                "CRITICAL" => summary.critical += 1,
                "HIGH" => summary.high += 1,
                "MEDIUM" => summary.medium += 1,
                "LOW" => summary.low += 1,
                _ => {}
            }
            vulnerabilities.push(Vulnerability {
                id: str_field(vuln, "VulnerabilityID"),
                title: str_field(vuln, "Title"),
                severity,
                package_name: str_field(vuln, "PkgName"),
                installed_version: str_field(vuln, "InstalledVersion"),
                fixed_version: str_field(vuln, "FixedVersion"),
            });
        }
    }

    ScanReport {
        image: image.to_string(),
        status: "success".into(),
        scan_tool: "trivy".into(),
        message: None,
        summary: Some(summary),
        vulnerabilities,
        scanned_components,
    }
}

fn str_field(v: &serde_json::Value, key: &str) -> String {
    v.get(key)
        .and_then(|s| s.as_str())
        .unwrap_or_default()
        .to_string()
}
