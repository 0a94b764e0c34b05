pub mod employee_pipeline;
