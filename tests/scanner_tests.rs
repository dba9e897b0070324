// Trivy report parsing tests (no trivy binary required)

use infrawatch::scanner::parse_trivy_report;

#[test]
fn parse_report_counts_by_severity() {
    let raw = serde_json::json!({
        "Results": [
            {
                "Target": "nginx:latest (debian 12.4)",
                "Type": "debian",
                "Class": "os-pkgs",
                "Vulnerabilities": [
                    {
                        "VulnerabilityID": "CVE-2023-0001",
                        "Title": "libfoo overflow",
                        "Severity": "CRITICAL",
                        "PkgName": "libfoo",
                        "InstalledVersion": "1.0.0",
                        "FixedVersion": "1.0.1"
                    },
                    {
                        "VulnerabilityID": "CVE-2023-0002",
                        "Title": "libbar leak",
                        "Severity": "high",
                        "PkgName": "libbar",
                        "InstalledVersion": "2.1.0"
                    }
                ]
            },
            {
                "Target": "app/requirements.txt",
                "Type": "pip",
                "Class": "lang-pkgs"
            }
        ]
    });

    let report = parse_trivy_report("nginx:latest", &raw);
    assert_eq!(report.status, "success");
    assert_eq!(report.image, "nginx:latest");

    let summary = report.summary.unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.critical, 1);
    assert_eq!(summary.high, 1);
    assert_eq!(summary.medium, 0);

    assert_eq!(report.vulnerabilities.len(), 2);
    assert_eq!(report.vulnerabilities[0].id, "CVE-2023-0001");
    assert_eq!(report.vulnerabilities[0].fixed_version, "1.0.1");
    // Severity is normalized to upper case
    assert_eq!(report.vulnerabilities[1].severity, "HIGH");
    assert_eq!(report.vulnerabilities[1].fixed_version, "");

    assert_eq!(report.scanned_components.len(), 2);
    assert_eq!(report.scanned_components[0].vulnerabilities_count, 2);
    assert_eq!(report.scanned_components[1].vulnerabilities_count, 0);
}

#[test]
fn parse_report_with_no_results_is_clean() {
    let raw = serde_json::json!({"SchemaVersion": 2});
    let report = parse_trivy_report("scratch", &raw);
    assert_eq!(report.status, "success");
    assert_eq!(report.summary.unwrap().total, 0);
    assert!(report.vulnerabilities.is_empty());
}
