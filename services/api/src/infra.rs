use competency_review::config::AssessmentConfig;
use competency_review::workflows::assessment::{AssessmentService, InMemoryEmployeeRepository};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type MemoryAssessmentService = AssessmentService<InMemoryEmployeeRepository>;

/// Service backed by a process-local store; returned with the store for inspection.
pub(crate) fn build_assessment_service(
    config: AssessmentConfig,
) -> (Arc<MemoryAssessmentService>, Arc<InMemoryEmployeeRepository>) {
    let repository = Arc::new(InMemoryEmployeeRepository::default());
    let service = Arc::new(AssessmentService::new(repository.clone(), config));
    (service, repository)
}

/// Small upload used by the demo when no file is supplied.
pub(crate) const SAMPLE_UPLOAD: &str = "\
Code,Year,Full Name,Title,Department,Division,\
Communication,Communication Req,Continuous Learning,Continuous Learning Req,\
Critical Thinking,Critical Thinking Req,Data Analysis,Data Analysis Req,\
Digital Literacy,Digital Literacy Req,Problem Solving,Problem Solving Req,\
Strategic Thinking,Strategic Thinking Req,Talent Management,Talent Management Req,\
Teamwork Leadership,Teamwork Leadership Req,\
Creative Thinking,Creative Thinking Req,Resilience,Resilience Req,\
AI Bigdata,AI Bigdata Req,Analytical Thinking,Analytical Thinking Req
E001,2025,Ana Lee,Officer,Finance,Operations,3,4,3,4,4,4,3,4,3,4,3,4,,,,,,,3,5,3,5,3,5,3,5
E002,2025,Bao Nguyen,Senior,Finance,Operations,4,4,4,4,4,4,3,4,4,4,4,4,,,,,,,4,5,4,5,3,5,3,5
E003,2025,Chi Do,Manager,Sales,Commercial,4,4,4,4,4,4,4,4,4,4,4,4,3,4,4,4,4,4,4,5,4,5,4,5,4,5
E004,2025,Duc Ha,Director,Sales,Commercial,5,4,5,4,4,4,5,4,5,4,5,4,5,4,4,4,5,4,5,5,5,5,4,5,4,5
E005,2025,Em Vo,Head of Unit,Technology,Commercial,5,4,5,4,5,4,5,4,5,4,5,4,5,4,5,4,5,4,5,5,5,5,5,5,5,5
E006,2025,Giang Ly,Officer,Technology,Operations,4,4,4,4,4,4,,4,4,4,4,4,,,,,,,4,5,4,5,4,5,4,5
E007,2025,Hoa Mai,Officer,Technology,Operations,4,4,4,4,4,4,4,4,4,4,4,4,3,4,,,,,4,5,4,5,4,5,4,5
";
