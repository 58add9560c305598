
mod create_test;
mod pipeline_test;
mod router_test;
mod scheduler_test;
