//! Fixed-size batch accumulation with continue-on-error submission.

use crate::service::{MetadataService, WriteOutcome, WriteRequest};
use tracing::warn;

/// Accumulates write requests and submits them in batches of at most
/// `capacity`. A full batch goes out immediately; the remainder goes
/// out on the final `flush`. Submission order carries no consistency
/// meaning — alternate keys do.
pub struct BatchWriter<'a, S: MetadataService> {
    service: &'a S,
    capacity: usize,
    pending: Vec<WriteRequest>,
    pub created: usize,
    pub updated: usize,
    pub faulted: usize,
}

impl<'a, S: MetadataService> BatchWriter<'a, S> {
    pub fn new(service: &'a S, capacity: usize) -> Self {
        Self {
            service,
            capacity: capacity.max(1),
            pending: Vec::new(),
            created: 0,
            updated: 0,
            faulted: 0,
        }
    }

    pub fn push(&mut self, request: WriteRequest) {
        self.pending.push(request);
        if self.pending.len() >= self.capacity {
            self.flush();
        }
    }

    /// Submit whatever is pending. Per-record faults are tallied, never
    /// raised; a transport failure faults the whole batch and the run
    /// continues.
    pub fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut self.pending);
        let batch_len = batch.len();
        match self.service.execute_batch(batch, true) {
            Ok(outcomes) => {
                for outcome in outcomes {
                    match outcome {
                        WriteOutcome::Created(_) => self.created += 1,
                        WriteOutcome::Updated(_) => self.updated += 1,
                        WriteOutcome::Failed { message } => {
                            warn!(error = %message, "record write failed");
                            self.faulted += 1;
                        }
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, records = batch_len, "batch submission failed");
                self.faulted += batch_len;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RecordFields, Value};
    use crate::service::memory::InMemoryService;
    use crate::service::WriteOp;

    fn request(key: &str) -> WriteRequest {
        let mut fields = RecordFields::new();
        fields.insert("dd_alternatekey".to_string(), Value::from(key));
        WriteRequest {
            table: "datadict_field".to_string(),
            op: WriteOp::Create,
            fields,
        }
    }

    #[test]
    fn test_full_batch_submits_immediately() {
        let service = InMemoryService::empty();
        let mut writer = BatchWriter::new(&service, 2);

        writer.push(request("a.A"));
        assert_eq!(service.record_count("datadict_field"), 0);
        writer.push(request("b.B"));
        assert_eq!(service.record_count("datadict_field"), 2);

        writer.push(request("c.C"));
        writer.flush();
        assert_eq!(service.record_count("datadict_field"), 3);
        assert_eq!(writer.created, 3);
    }

    #[test]
    fn test_transport_failure_faults_whole_batch() {
        let service = InMemoryService::empty();
        service.fail_batches();
        let mut writer = BatchWriter::new(&service, 10);

        for key in ["a.A", "b.B", "c.C"] {
            writer.push(request(key));
        }
        writer.flush();

        assert_eq!(writer.created, 0);
        assert_eq!(writer.faulted, 3);
        assert_eq!(service.record_count("datadict_field"), 0);

        // The writer stays usable after a failed submission.
        writer.push(request("d.D"));
        writer.flush();
        assert_eq!(writer.faulted, 4);
    }

    #[test]
    fn test_faults_are_counted_not_raised() {
        let service = InMemoryService::empty();
        service.reject_writes_containing("bad.Key");
        let mut writer = BatchWriter::new(&service, 10);

        for key in ["a.A", "bad.Key", "b.B"] {
            writer.push(request(key));
        }
        writer.flush();

        assert_eq!(writer.created, 2);
        assert_eq!(writer.faulted, 1);
        assert_eq!(service.record_count("datadict_field"), 2);
    }
}
