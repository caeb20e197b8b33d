//! TypeScript bindings for the API types consumed by the web client.
//!
//! Compiled only for tests. Running the test suite writes one `.ts` file per
//! exported type.

#[cfg(test)]
mod tests {
    use std::{env, path::PathBuf};

    use ts_rs::TS;

    use crate::api::ErrorResponse;
    use crate::models::*;

    #[test]
    fn generate_typescript_types() {
        // ATTENDANCE_TS_OUTPUT_DIR wins; otherwise a ts-bindings directory
        // next to the crate.
        let output_dir = env::var("ATTENDANCE_TS_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("../ts-bindings"));

        std::fs::create_dir_all(&output_dir).expect("Failed to create output directory");

        // Stale files from renamed or removed types would otherwise linger.
        for entry in std::fs::read_dir(&output_dir).expect("Failed to read output directory") {
            let path = entry.expect("Failed to read directory entry").path();
            if path.extension().and_then(|s| s.to_str()) == Some("ts") {
                std::fs::remove_file(&path)
                    .unwrap_or_else(|e| panic!("Failed to remove {:?}: {}", path, e));
            }
        }

        AttendanceRecord::export_all_to(&output_dir).expect("Failed to export AttendanceRecord");
        CheckInInput::export_all_to(&output_dir).expect("Failed to export CheckInInput");
        CheckInResponse::export_all_to(&output_dir).expect("Failed to export CheckInResponse");
        CheckInCount::export_all_to(&output_dir).expect("Failed to export CheckInCount");

        StartSessionInput::export_all_to(&output_dir).expect("Failed to export StartSessionInput");
        SessionView::export_all_to(&output_dir).expect("Failed to export SessionView");

        CourseRequest::export_all_to(&output_dir).expect("Failed to export CourseRequest");
        CourseRequestInput::export_all_to(&output_dir).expect("Failed to export CourseRequestInput");
        CourseRequestStatusInput::export_all_to(&output_dir)
            .expect("Failed to export CourseRequestStatusInput");
        CourseRequestStatus::export_all_to(&output_dir).expect("Failed to export CourseRequestStatus");

        ErrorResponse::export_all_to(&output_dir).expect("Failed to export ErrorResponse");

        let written = std::fs::read_dir(&output_dir)
            .expect("Failed to read output directory")
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("ts"))
            .count();
        assert!(written >= 11, "expected at least 11 bindings, found {}", written);
    }
}
