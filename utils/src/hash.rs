use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;

pub type HashMap<K, V> = FxHashMap<K, V>;
pub type HashSet<T> = FxHashSet<T>;
