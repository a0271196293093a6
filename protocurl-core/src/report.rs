//! # Progress reporting
//!
//! The core never prints. Everything the operator should see on the happy path, and the
//! relayed output of `protoc` and `curl`, goes through a [`Reporter`] supplied by the caller.

/// Receives the intermediate artifacts of a workflow run, in order.
pub trait Reporter {
    /// The encoded request, and its re-decoded text in the configured output format.
    fn request(&self, text: &str, binary: &[u8]);

    /// Raw response headers and body, once the status has been validated.
    fn response_received(&self, headers: &str, binary: &[u8]);

    /// The decoded response.
    fn response_text(&self, text: &str);

    /// Output of a delegated subprocess (`protoc`, `curl`), relayed for diagnosis.
    ///
    /// Called before any error caused by that subprocess is returned.
    fn tool_output(&self, tool: &str, stdout: &str, stderr: &str);
}
