/// Human-readable description of a configured stage, used for reproducibility logs.
///
/// Purely metadata: nothing in the pipeline branches on these strings.
pub trait MethodInfo {
    /// Short method name, e.g. `"Standard Blocking"`.
    fn method_name(&self) -> String;

    /// Parameter summary, e.g. `"max block size=50"`. Empty for parameter-free methods.
    fn method_configuration(&self) -> String;
}
