// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use tempfile::TempDir;
use tempfile::tempdir;

use crate::collection::Collection;
use crate::error::Fallible;

/// Create an empty collection in a temporary directory. The directory is
/// removed when the returned guard is dropped.
pub fn create_tmp_collection() -> Fallible<(TempDir, Collection)> {
    let dir = tempdir()?;
    let coll = Collection::new(Some(dir.path().display().to_string()))?;
    Ok((dir, coll))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tmp_collection() -> Fallible<()> {
        let (dir, coll) = create_tmp_collection()?;
        assert_eq!(coll.directory, dir.path().canonicalize()?);
        assert_eq!(coll.db.card_count()?, 0);
        Ok(())
    }
}
