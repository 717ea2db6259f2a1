use jio_hashes::HashWriter;

use crate::tx::{Transaction, TransactionId};

/// Transaction id: double-SHA256 over the full transaction encoding
pub fn id(tx: &Transaction) -> TransactionId {
    let mut writer = HashWriter::new();
    writer.write_u16(tx.version).write_u64(tx.inputs.len() as u64);
    for input in tx.inputs.iter() {
        writer
            .update(input.previous_outpoint.transaction_id)
            .write_u32(input.previous_outpoint.index)
            .write_var_bytes(&input.signature_script)
            .write_u64(input.sequence);
    }
    writer.write_u64(tx.outputs.len() as u64);
    for output in tx.outputs.iter() {
        writer
            .write_u64(output.value)
            .write_u16(output.script_public_key.version)
            .write_var_bytes(&output.script_public_key.script);
    }
    writer.write_u64(tx.lock_time).write_var_bytes(&tx.payload);
    writer.finalize()
}
